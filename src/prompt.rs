//! Deterministic prompt rendering, one function per entity kind.
//!
//! Prompts interpolate aggregated facts only — no clocks, no randomness —
//! so repeated runs over unchanged input produce byte-identical prompts
//! even though the model's answers vary.

use crate::types::{AreaRollup, DeveloperRollup, DevelopmentRollup, Property, RangeStats};

/// System instruction sent with every generation call.
pub const JSON_SYSTEM_PROMPT: &str = "You are a JSON generator for real estate marketing \
content. Respond with ONLY valid JSON. No markdown, no code fences, no explanatory text. \
Start with { and end with }.";

/// Format a price with dot thousands separators, e.g. `€1.250.000`.
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('€');
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + digits.len() - offset) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

fn format_range(range: &Option<RangeStats>, unit: &str) -> String {
    match range {
        None => "not specified".to_string(),
        Some(r) if r.min == r.max => format!("{}{}", r.min, unit),
        Some(r) => format!("{}-{}{}", r.min, r.max, unit),
    }
}

fn format_price_range(range: &Option<RangeStats>) -> String {
    match range {
        None => "on request".to_string(),
        Some(r) if r.min == r.max => format_price(r.min),
        Some(r) => format!("{} - {}", format_price(r.min), format_price(r.max)),
    }
}

pub fn property_prompt(property: &Property) -> String {
    let location = if property.zone.is_empty() {
        format!("{}, {}", property.town, property.province)
    } else {
        format!("{}, {}, {}", property.zone, property.town, property.province)
    };
    let description_excerpt: String = property.description.chars().take(500).collect();

    format!(
        "Generate SEO-optimized content for this Costa Blanca property listing.\n\
        \n\
        Property Details:\n\
        - Reference: {reference}\n\
        - Type: {property_type}\n\
        - Location: {location}\n\
        - Bedrooms: {bedrooms}\n\
        - Bathrooms: {bathrooms}\n\
        - Built Area: {built}m2\n\
        - Plot Area: {plot}m2\n\
        - Price: {price}\n\
        - Pool: {pool}\n\
        - Views: {views}\n\
        - Original Description: {description}\n\
        \n\
        Generate a JSON response with:\n\
        {{\n\
        \x20 \"metaTitle\": \"SEO title under 60 chars, include location and key feature\",\n\
        \x20 \"metaDescription\": \"Compelling description under 155 chars\",\n\
        \x20 \"heroIntro\": \"2-3 paragraph introduction about this property and its location\",\n\
        \x20 \"locationSection\": {{\n\
        \x20   \"intro\": \"1-2 paragraphs about living in this area\",\n\
        \x20   \"highlights\": [\"5-6 nearby attractions/amenities with distances\"]\n\
        \x20 }},\n\
        \x20 \"propertyFeatures\": {{\n\
        \x20   \"intro\": \"Brief intro to the property's standout features\",\n\
        \x20   \"features\": [\"8-10 key features based on the specs\"]\n\
        \x20 }},\n\
        \x20 \"investmentSection\": \"1-2 paragraphs about rental/investment potential\",\n\
        \x20 \"whyBuySection\": [\"5-6 reasons to buy this property\"],\n\
        \x20 \"faqs\": [{{\"question\": \"...\", \"answer\": \"...\"}}]\n\
        }}\n\
        \n\
        Write naturally, avoiding cliches. Focus on specific details about {town}. \
        Return ONLY valid JSON.",
        reference = property.reference,
        property_type = property.property_type,
        location = location,
        bedrooms = property.bedrooms,
        bathrooms = property.bathrooms,
        built = property.built_area,
        plot = property.plot_area,
        price = if property.price > 0 {
            format_price(property.price)
        } else {
            "Price on request".to_string()
        },
        pool = if property.pool { "Yes" } else { "No" },
        views = if property.views.is_empty() {
            "Not specified"
        } else {
            &property.views
        },
        description = description_excerpt,
        town = property.town,
    )
}

pub fn area_prompt(area: &AreaRollup) -> String {
    format!(
        "Generate a comprehensive SEO area guide for {town}, Costa Blanca, Spain.\n\
        \n\
        Current market data:\n\
        - {count} new build properties available\n\
        - Property types: {types}\n\
        - Price range: {prices}\n\
        \n\
        Generate a JSON response with:\n\
        {{\n\
        \x20 \"metaTitle\": \"Living in {town}: Complete Guide | under 60 chars\",\n\
        \x20 \"metaDescription\": \"Compelling description under 155 chars\",\n\
        \x20 \"heroIntro\": \"2-3 paragraph introduction about {town}\",\n\
        \x20 \"climate\": \"Paragraph about the climate and weather\",\n\
        \x20 \"lifestyle\": \"2 paragraphs about daily life, expat community, atmosphere\",\n\
        \x20 \"amenities\": {{\"healthcare\": \"...\", \"shopping\": \"...\", \"dining\": \"...\", \"sports\": \"...\"}},\n\
        \x20 \"transport\": {{\"airports\": \"...\", \"driving\": \"...\", \"public\": \"...\"}},\n\
        \x20 \"propertyMarket\": {{\"overview\": \"...\", \"priceRange\": \"{prices}\", \"popularTypes\": \"{types}\", \"investment\": \"...\"}},\n\
        \x20 \"neighborhoods\": [\"3-4 popular neighborhoods in {town}\"],\n\
        \x20 \"prosAndCons\": {{\"pros\": [\"5 advantages\"], \"cons\": [\"2-3 honest considerations\"]}},\n\
        \x20 \"faqs\": [{{\"question\": \"...\", \"answer\": \"...\"}}]\n\
        }}\n\
        \n\
        Be specific to {town}. Include real place names, distances, and practical \
        information buyers need. Return ONLY valid JSON.",
        town = area.town,
        count = area.property_count,
        types = area.property_types.join(", "),
        prices = format_price_range(&area.price_range),
    )
}

pub fn developer_prompt(developer: &DeveloperRollup) -> String {
    let delivery_window = match (&developer.earliest_delivery, &developer.latest_delivery) {
        (Some(from), Some(to)) => format!("{} to {}", from, to),
        _ => "not specified".to_string(),
    };

    format!(
        "You are an expert SEO copywriter for a real estate agency in Costa Blanca, Spain. \
        Generate content for a developer/builder page.\n\
        \n\
        IMPORTANT CONTEXT:\n\
        - We are an AGENCY showcasing properties from this developer, NOT the developer\n\
        - Content must be factual based on the data provided - don't invent details\n\
        \n\
        DEVELOPER DATA:\n\
        DEVELOPER: {name}\n\
        PROPERTIES: {property_count} units across {development_count} developments\n\
        DEVELOPMENTS: {developments}\n\
        ZONES: {zones}\n\
        DELIVERY TIMELINE: {delivery}\n\
        SPECIALIZATION: {specialization}\n\
        \n\
        Generate content in this EXACT JSON format:\n\
        {{\n\
        \x20 \"metaTitle\": \"50-60 chars, keyword-rich, include developer name\",\n\
        \x20 \"metaDescription\": \"150-160 chars, include developer name and locations\",\n\
        \x20 \"heroHeadline\": \"Compelling H1, 6-10 words\",\n\
        \x20 \"heroIntro\": \"2 paragraphs introducing the developer\",\n\
        \x20 \"aboutSection\": \"3-4 paragraphs about their active developments\",\n\
        \x20 \"specializationSection\": \"2 paragraphs about what makes this developer notable\",\n\
        \x20 \"developmentsSection\": \"2-3 paragraphs overview of their portfolio\",\n\
        \x20 \"whyChooseSection\": [\"6-8 reasons to consider this developer's properties\"],\n\
        \x20 \"faqs\": [{{\"question\": \"Where does {name} build?\", \"answer\": \"...\"}}],\n\
        \x20 \"conclusion\": \"1-2 paragraphs with a clear contact CTA\"\n\
        }}\n\
        \n\
        CRITICAL RULES:\n\
        1. Only state facts we have data for - no invented company history\n\
        2. Use phrases like \"currently offering\", \"active developments include\"\n\
        3. Return ONLY valid JSON, no markdown code blocks",
        name = developer.developer,
        property_count = developer.references.len(),
        development_count = developer.developments.len(),
        developments = developer.developments.join("; "),
        zones = developer.zones.join(", "),
        delivery = delivery_window,
        specialization = if developer.is_golf_specialist {
            "Golf Properties"
        } else {
            "New Build Homes"
        },
    )
}

pub fn development_prompt(development: &DevelopmentRollup) -> String {
    format!(
        "Generate SEO content for a new build development page on a Costa Blanca real \
        estate agency site.\n\
        \n\
        DEVELOPMENT DATA:\n\
        DEVELOPMENT: {name}\n\
        DEVELOPER: {developer}\n\
        ZONE: {zone}\n\
        UNITS: {count}\n\
        PRICE FROM: {price_from}\n\
        BEDROOMS: {bedrooms}\n\
        BATHROOMS: {bathrooms}\n\
        BUILT AREA: {built}\n\
        PLOT AREA: {plot}\n\
        PROPERTY TYPES: {types}\n\
        POOL: {pool}\n\
        DELIVERY: {delivery}\n\
        \n\
        Generate a JSON response with:\n\
        {{\n\
        \x20 \"metaTitle\": \"Development name + location, under 60 chars\",\n\
        \x20 \"metaDescription\": \"Compelling description under 155 chars with price from\",\n\
        \x20 \"heroIntro\": \"2-3 paragraphs introducing the development\",\n\
        \x20 \"areaSection\": \"2 paragraphs about the surrounding area\",\n\
        \x20 \"propertyFeatures\": {{\"intro\": \"...\", \"features\": [\"8-10 features from the specs\"]}},\n\
        \x20 \"lifestyleSection\": \"2 paragraphs about the lifestyle on offer\",\n\
        \x20 \"investmentSection\": \"1-2 paragraphs on investment potential with the price point\",\n\
        \x20 \"faqs\": [{{\"question\": \"...\", \"answer\": \"...\"}}],\n\
        \x20 \"conclusion\": \"Closing paragraph with a contact CTA\"\n\
        }}\n\
        \n\
        CRITICAL RULES:\n\
        1. Only use the facts above - do not invent amenities or specifications\n\
        2. Lead with the price point and delivery timeline\n\
        3. Return ONLY valid JSON, no markdown code blocks",
        name = development.development,
        developer = development.developer,
        zone = development.zone.as_deref().unwrap_or("Costa Blanca"),
        count = development.property_count,
        price_from = format_price(development.price_from),
        bedrooms = format_range(&development.bedroom_range, ""),
        bathrooms = format_range(&development.bathroom_range, ""),
        built = format_range(&development.built_area_range, "m2"),
        plot = format_range(&development.plot_area_range, "m2"),
        types = development.property_types.join(", "),
        pool = if development.has_pool { "Yes" } else { "No" },
        delivery = development.delivery_date,
    )
}
