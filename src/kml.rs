//! KML document generation: one `<Placemark>` per record, in input order.

use std::io::Cursor;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::extract::PlacemarkRecord;

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Serialize the record list into a complete KML document.
///
/// `image_hrefs` runs parallel to `records`; a `Some` entry is the
/// archive-relative path of that record's embedded thumbnail. Identical
/// inputs produce byte-identical output.
pub fn build_kml(
    records: &[PlacemarkRecord],
    image_hrefs: &[Option<String>],
) -> anyhow::Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let kml = BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]);
    writer.write_event(Event::Start(kml))?;
    writer.write_event(Event::Start(BytesStart::new("Document")))?;

    writer.write_event(Event::Start(BytesStart::new("name")))?;
    writer.write_event(Event::Text(BytesText::new("Geotagged images")))?;
    writer.write_event(Event::End(BytesEnd::new("name")))?;

    for (record, href) in records.iter().zip(image_hrefs) {
        write_placemark(&mut writer, record, href.as_deref())?;
    }

    writer.write_event(Event::End(BytesEnd::new("Document")))?;
    writer.write_event(Event::End(BytesEnd::new("kml")))?;

    let bytes = writer.into_inner().into_inner();
    // The writer only ever receives valid UTF-8.
    Ok(String::from_utf8(bytes).expect("generated KML is UTF-8"))
}

fn write_placemark(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    record: &PlacemarkRecord,
    image_href: Option<&str>,
) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("Placemark")))?;

    writer.write_event(Event::Start(BytesStart::new("name")))?;
    writer.write_event(Event::Text(BytesText::new(&record.label)))?;
    writer.write_event(Event::End(BytesEnd::new("name")))?;

    writer.write_event(Event::Start(BytesStart::new("description")))?;
    writer.write_event(Event::CData(BytesCData::new(description_html(
        record, image_href,
    ))))?;
    writer.write_event(Event::End(BytesEnd::new("description")))?;

    // KML <when> requires a defined instant, so naive local timestamps
    // appear only in the description.
    if let Some(when) = record.timestamp.as_ref().and_then(|ts| ts.kml_when()) {
        writer.write_event(Event::Start(BytesStart::new("TimeStamp")))?;
        writer.write_event(Event::Start(BytesStart::new("when")))?;
        writer.write_event(Event::Text(BytesText::new(&when)))?;
        writer.write_event(Event::End(BytesEnd::new("when")))?;
        writer.write_event(Event::End(BytesEnd::new("TimeStamp")))?;
    }

    writer.write_event(Event::Start(BytesStart::new("Point")))?;
    writer.write_event(Event::Start(BytesStart::new("coordinates")))?;
    writer.write_event(Event::Text(BytesText::new(&coordinates(record))))?;
    writer.write_event(Event::End(BytesEnd::new("coordinates")))?;
    writer.write_event(Event::End(BytesEnd::new("Point")))?;

    writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
    Ok(())
}

/// KML coordinate order is longitude,latitude[,altitude].
fn coordinates(record: &PlacemarkRecord) -> String {
    match record.altitude_m {
        Some(alt) => format!("{},{},{}", record.longitude, record.latitude, alt),
        None => format!("{},{}", record.longitude, record.latitude),
    }
}

fn description_html(record: &PlacemarkRecord, image_href: Option<&str>) -> String {
    let mut html = String::new();
    if let Some(href) = image_href {
        html.push_str(&format!("<img src=\"{href}\"/>\n"));
    }
    html.push_str(&format!(
        "<p>Source: {}</p>\n",
        record.source_path.display()
    ));
    if let Some(ts) = &record.timestamp {
        html.push_str(&format!("<p>Captured: {}</p>\n", ts.display()));
    }
    html
}
