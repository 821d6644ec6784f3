use property_aggregator::sources::{FeedParser, KyeroParser, SoopremaParser};

const KYERO_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
  <kyero>
    <feed_version>3</feed_version>
  </kyero>
  <property>
    <id>N9525</id>
    <price>250000</price>
    <type><en>Apartment</en><es>Apartamento</es></type>
    <town>Torrevieja</town>
    <province>Alicante</province>
    <location_detail>Aguas Nuevas</location_detail>
    <beds>2</beds>
    <baths>2</baths>
    <pool>1</pool>
    <surface_area>
      <built>85</built>
      <plot>0</plot>
    </surface_area>
    <desc>
      <en><![CDATA[Modern apartment close to the beach.]]></en>
      <es><![CDATA[Apartamento moderno cerca de la playa.]]></es>
    </desc>
    <images>
      <image id="1"><url>https://cdn.example.com/n9525-1.jpg</url></image>
      <image id="2"><url>https://cdn.example.com/n9525-2.jpg</url></image>
    </images>
    <features>
      <feature>Communal pool</feature>
      <feature>Gated community</feature>
    </features>
  </property>
  <property>
    <id>N9526</id>
    <price>460000</price>
    <type><en>Villa</en></type>
    <town>Rojales</town>
    <province>Alicante</province>
    <beds>3</beds>
    <baths>3</baths>
    <pool>0</pool>
    <desc>
      <es><![CDATA[Villa con piscina privada.]]></es>
    </desc>
    <images>
      <image id="1"><url>https://cdn.example.com/n9526-1.jpg</url></image>
    </images>
  </property>
  <property>
    <garbage>nothing useful here</garbage>
  </property>
</root>"#;

const SOOPREMA_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sooprema>
  <properties>
    <property>
      <reference>BP-101</reference>
      <saleType>1</saleType>
      <title>New build villa in Pedreguer</title>
      <description>Detached villa with sea views.</description>
      <type>Villa</type>
      <rooms>4</rooms>
      <baths>3</baths>
      <built>220</built>
      <plot>800</plot>
      <price>795000</price>
      <location>
        <town>Pedreguer</town>
        <province>Alicante</province>
        <zone>Monte Solana</zone>
      </location>
      <pool>yes</pool>
      <images>
        <image><url>https://cdn.example.com/bp101.jpg</url></image>
      </images>
    </property>
    <property>
      <reference>BP-102</reference>
      <saleType>2</saleType>
      <title>Resale townhouse</title>
      <type>Townhouse</type>
      <rooms>3</rooms>
      <price>180000</price>
      <location><town>Denia</town></location>
    </property>
  </properties>
</sooprema>"#;

#[test]
fn test_kyero_parser_extracts_canonical_fields() {
    let parser = KyeroParser::new("general");
    let properties = parser.parse(KYERO_SAMPLE);
    assert_eq!(properties.len(), 3);

    let first = &properties[0];
    assert_eq!(first.reference, "N9525");
    assert_eq!(first.price, 250_000);
    assert_eq!(first.property_type, "Apartment");
    assert_eq!(first.town, "Torrevieja");
    assert_eq!(first.zone, "Aguas Nuevas");
    assert_eq!(first.bedrooms, 2);
    assert_eq!(first.bathrooms, 2);
    assert_eq!(first.built_area, 85);
    assert_eq!(first.plot_area, 0);
    assert!(first.pool);
    assert_eq!(first.description, "Modern apartment close to the beach.");
    assert_eq!(first.images.len(), 2);
    assert_eq!(first.features, vec!["Communal pool", "Gated community"]);
    assert_eq!(first.source, "general");
}

#[test]
fn test_kyero_parser_falls_back_through_locales() {
    let parser = KyeroParser::new("general");
    let properties = parser.parse(KYERO_SAMPLE);

    // Second record only carries a Spanish description.
    let second = &properties[1];
    assert_eq!(second.description, "Villa con piscina privada.");
    assert_eq!(second.images, vec!["https://cdn.example.com/n9526-1.jpg"]);
}

#[test]
fn test_malformed_record_is_coerced_not_dropped() {
    let parser = KyeroParser::new("general");
    let properties = parser.parse(KYERO_SAMPLE);

    // The garbage record survives with empty/zero fields: its existence
    // still matters for counts.
    let third = &properties[2];
    assert_eq!(third.reference, "");
    assert_eq!(third.price, 0);
    assert_eq!(third.bedrooms, 0);
    assert!(third.images.is_empty());
}

#[test]
fn test_kyero_parser_handles_singleton_image() {
    let xml = r#"<root>
      <property>
        <id>X1</id>
        <images><image id="1"><url>https://cdn.example.com/only.jpg</url></image></images>
      </property>
    </root>"#;
    let parser = KyeroParser::new("general");
    let properties = parser.parse(xml);
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].images, vec!["https://cdn.example.com/only.jpg"]);
}

#[test]
fn test_non_xml_document_yields_empty_list() {
    let parser = KyeroParser::new("general");
    assert!(parser.parse("this is not xml at all").is_empty());
    assert!(parser.parse("").is_empty());
}

#[test]
fn test_sooprema_parser_keeps_new_builds_only() {
    let parser = SoopremaParser::new("background");
    let properties = parser.parse(SOOPREMA_SAMPLE);

    // BP-102 has saleType 2 (resale) and is filtered out.
    assert_eq!(properties.len(), 1);
    let p = &properties[0];
    assert_eq!(p.reference, "BP-101");
    assert_eq!(p.town, "Pedreguer");
    assert_eq!(p.province, "Alicante");
    assert_eq!(p.zone, "Monte Solana");
    assert_eq!(p.bedrooms, 4);
    assert_eq!(p.built_area, 220);
    assert_eq!(p.plot_area, 800);
    assert_eq!(p.price, 795_000);
    assert!(p.pool);
    assert_eq!(p.source, "background");
}
