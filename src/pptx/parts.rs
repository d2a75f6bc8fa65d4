//! Markup for the parts that depend on the deck's content.

use std::fmt::Write as _;

use quick_xml::escape::escape;

use super::package::{PptxPage, Shape};
use super::templates::{GROUP_PROPERTIES, NS_A, NS_P, NS_R, XML_DECL};
use super::{Align, DocumentProperties, WriterError};
use crate::constants::assembly::EMU_PER_INCH;
use crate::geometry::{Placement, Size};

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_CORE: &str = "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

const CT_BASE: &str = "application/vnd.openxmlformats-officedocument";

/// Slide master id; layout ids follow it.
const MASTER_ID: u32 = 2_147_483_648;

/// First slide id allowed by the format.
const FIRST_SLIDE_ID: usize = 256;

/// Inches to English Metric Units.
pub fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// A relationship from one part to another.
pub struct Rel {
    pub id: String,
    pub kind: &'static str,
    pub target: String,
}

impl Rel {
    pub fn new(index: usize, kind: &'static str, target: impl Into<String>) -> Self {
        Self { id: format!("rId{index}"), kind, target: target.into() }
    }
}

pub fn relationships(rels: &[Rel]) -> String {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    for rel in rels {
        let kind = if rel.kind == "core-properties" {
            REL_CORE.to_string()
        } else {
            format!("{REL_BASE}/{}", rel.kind)
        };
        let _ = write!(xml, r#"<Relationship Id="{}" Type="{kind}" Target="{}"/>"#, rel.id, escape(&rel.target));
    }
    xml.push_str("</Relationships>");
    xml
}

/// `[Content_Types].xml`. `overrides` pairs part names with content types.
pub fn content_types(image_extensions: &[&str], overrides: &[(String, String)]) -> String {
    let mut xml = String::with_capacity(1024 + overrides.len() * 160);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for ext in image_extensions {
        let mime = match *ext {
            "svg" => "image/svg+xml".to_string(),
            other => format!("image/{other}"),
        };
        let _ = write!(xml, r#"<Default Extension="{ext}" ContentType="{mime}"/>"#);
    }
    for (part, content_type) in overrides {
        let _ = write!(xml, r#"<Override PartName="/{part}" ContentType="{content_type}"/>"#);
    }
    xml.push_str("</Types>");
    xml
}

/// Content type of a presentationml part such as `slide` or `notesMaster`.
pub fn presentation_ct(kind: &str) -> String {
    format!("{CT_BASE}.presentationml.{kind}+xml")
}

pub fn theme_ct() -> String {
    format!("{CT_BASE}.theme+xml")
}

pub fn core_ct() -> String {
    "application/vnd.openxmlformats-package.core-properties+xml".to_string()
}

pub fn app_ct() -> String {
    format!("{CT_BASE}.extended-properties+xml")
}

/// `ppt/presentation.xml`. `slide_rels` are the relationship ids of the
/// slides in order.
pub fn presentation(size: Size, notes_master_rel: Option<&str>, slide_rels: &[String]) -> String {
    let mut xml = String::with_capacity(1024 + slide_rels.len() * 48);
    xml.push_str(XML_DECL);
    let _ = write!(
        xml,
        r#"<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1">"#
    );
    let _ = write!(xml, r#"<p:sldMasterIdLst><p:sldMasterId id="{MASTER_ID}" r:id="rId1"/></p:sldMasterIdLst>"#);
    if let Some(rel) = notes_master_rel {
        let _ = write!(xml, r#"<p:notesMasterIdLst><p:notesMasterId r:id="{rel}"/></p:notesMasterIdLst>"#);
    }
    if !slide_rels.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for (index, rel) in slide_rels.iter().enumerate() {
            let _ = write!(xml, r#"<p:sldId id="{}" r:id="{rel}"/>"#, FIRST_SLIDE_ID + index);
        }
        xml.push_str("</p:sldIdLst>");
    }
    let _ = write!(xml, r#"<p:sldSz cx="{}" cy="{}"/>"#, emu(size.width), emu(size.height));
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");
    xml
}

/// `ppt/slides/slideN.xml`. `image_rels` are the relationship ids of the
/// page's images in placement order.
pub fn slide(page: &PptxPage, image_rels: &[String]) -> Result<String, WriterError> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#);
    xml.push_str("<p:cSld>");

    if let Some(color) = page.background {
        let _ = write!(
            xml,
            r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
            color.hex()
        );
    }

    xml.push_str("<p:spTree>");
    xml.push_str(GROUP_PROPERTIES);

    // Shape ids must be unique within the slide; the group uses 1.
    let mut images = image_rels.iter();
    for (n, shape) in page.shapes.iter().enumerate() {
        let id = n + 2;
        match shape {
            Shape::Picture { placement, .. } => {
                let rel = images
                    .next()
                    .ok_or_else(|| WriterError::part("slide", "picture without a relationship"))?;
                write_picture(&mut xml, id, rel, placement);
            }
            Shape::Text { text, placement, style } => {
                let _ = write!(
                    xml,
                    r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#
                );
                xml.push_str("<p:spPr>");
                write_xfrm(&mut xml, placement);
                xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);
                xml.push_str(r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0" anchor="ctr"/><a:lstStyle/>"#);
                let align = match style.align {
                    Align::Left => "l",
                    Align::Center => "ctr",
                    Align::Right => "r",
                };
                if text.is_empty() {
                    xml.push_str("<a:p/>");
                }
                for line in text.lines() {
                    let _ = write!(
                        xml,
                        concat!(
                            r#"<a:p><a:pPr algn="{align}"/><a:r><a:rPr lang="en-US" sz="{size}" dirty="0">"#,
                            r#"<a:solidFill><a:srgbClr val="{color}"/></a:solidFill>"#,
                            r#"<a:latin typeface="{font}"/><a:cs typeface="{font}"/></a:rPr>"#,
                            "<a:t>{text}</a:t></a:r></a:p>",
                        ),
                        align = align,
                        size = (style.size_pt * 100.0).round() as i64,
                        color = style.color.hex(),
                        font = escape(&style.font),
                        text = escape(line),
                    );
                }
                xml.push_str("</p:txBody></p:sp>");
            }
        }
    }

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sld>");
    Ok(xml)
}

fn write_picture(xml: &mut String, id: usize, rel: &str, placement: &Placement) {
    let _ = write!(
        xml,
        concat!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/>"#,
            r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
            r#"<p:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
            "<p:spPr>",
        ),
        id = id,
        rel = rel,
    );
    write_xfrm(xml, placement);
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
}

fn write_xfrm(xml: &mut String, placement: &Placement) {
    let _ = write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        emu(placement.x),
        emu(placement.y),
        emu(placement.width),
        emu(placement.height)
    );
}

/// `ppt/notesSlides/notesSlideN.xml`. Each line becomes a paragraph.
pub fn notes_slide(notes: &str) -> String {
    let mut xml = String::with_capacity(1024 + notes.len());
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<p:notes xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#);
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(GROUP_PROPERTIES);
    xml.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Notes Placeholder 1"/>"#);
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr>"#);
    xml.push_str("<p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>");
    for line in notes.split('\n') {
        if line.is_empty() {
            xml.push_str("<a:p/>");
        } else {
            let _ = write!(xml, r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#, escape(line));
        }
    }
    xml.push_str("</p:txBody></p:sp>");
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:notes>");
    xml
}

/// `docProps/core.xml`.
pub fn core_properties(properties: &DocumentProperties) -> String {
    let stamp = properties.created.format("%Y-%m-%dT%H:%M:%SZ");
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    xml.push_str(concat!(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
        r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
        r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    ));
    let title = escape(&properties.title);
    let author = escape(&properties.author);
    let _ = write!(
        xml,
        concat!(
            "<dc:title>{title}</dc:title><dc:creator>{author}</dc:creator>",
            "<cp:lastModifiedBy>{author}</cp:lastModifiedBy><cp:revision>1</cp:revision>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified>"#,
        ),
        title = title,
        author = author,
        stamp = stamp,
    );
    xml.push_str("</cp:coreProperties>");
    xml
}

/// `docProps/app.xml`.
pub fn app_properties(application: &str, slides: usize, notes: usize) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#,
            r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
            "<Application>{app}</Application><PresentationFormat>On-screen Show (16:9)</PresentationFormat>",
            "<Slides>{slides}</Slides><Notes>{notes}</Notes>",
            "</Properties>",
        ),
        decl = XML_DECL,
        app = escape(application),
        slides = slides,
        notes = notes,
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn inches_convert_to_emu() {
        assert_eq!(emu(10.0), 9_144_000);
        assert_eq!(emu(5.625), 5_143_500);
        assert_eq!(emu(0.0), 0);
    }

    #[test]
    fn notes_escape_and_split_lines() {
        let xml = notes_slide("Created with slidemerge\n\nSource: a<b>&c.pdf");
        assert!(xml.contains("<a:t>Created with slidemerge</a:t>"));
        assert!(xml.contains("<a:p/>"));
        assert!(xml.contains("Source: a&lt;b&gt;&amp;c.pdf"));
    }

    #[test]
    fn empty_presentation_has_no_slide_list() {
        let xml = presentation(Size::new(10.0, 5.625), None, &[]);
        assert!(!xml.contains("sldIdLst"));
        assert!(xml.contains(r#"<p:sldSz cx="9144000" cy="5143500"/>"#));
    }

    #[test]
    fn relationships_use_full_type_uris() {
        let xml = relationships(&[
            Rel::new(1, "officeDocument", "ppt/presentation.xml"),
            Rel::new(2, "core-properties", "docProps/core.xml"),
        ]);
        assert!(xml.contains(&format!("{REL_BASE}/officeDocument")));
        assert!(xml.contains(REL_CORE));
    }
}
