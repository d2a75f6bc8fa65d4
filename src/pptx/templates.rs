//! Fixed package parts: theme, master, the blank layout and the notes master.
//!
//! Every slide uses the single blank layout, so these never vary with the
//! deck's content.

pub const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

/// Empty shape tree header shared by every slide-like part.
pub const GROUP_PROPERTIES: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
);

const COLOR_MAP: &str = concat!(
    r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
    r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
);

pub fn slide_master() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:sldMaster xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#,
            "<p:spTree>{group}</p:spTree></p:cSld>",
            "{clr}",
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "</p:sldMaster>",
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = GROUP_PROPERTIES,
        clr = COLOR_MAP,
    )
}

pub fn blank_layout() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:sldLayout xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank"><p:spTree>{group}</p:spTree></p:cSld>"#,
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>",
            "</p:sldLayout>",
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = GROUP_PROPERTIES,
    )
}

pub fn notes_master() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:notesMaster xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#,
            "<p:spTree>{group}</p:spTree></p:cSld>",
            "{clr}",
            "</p:notesMaster>",
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = GROUP_PROPERTIES,
        clr = COLOR_MAP,
    )
}

pub fn pres_props() -> String {
    format!(r#"{XML_DECL}<p:presentationPr xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"/>"#)
}

pub fn view_props() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:viewPr xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:normalViewPr><p:restoredLeft sz="15620"/><p:restoredTop sz="94660"/></p:normalViewPr>"#,
            r#"<p:gridSpacing cx="76200" cy="76200"/>"#,
            "</p:viewPr>",
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
    )
}

pub fn table_styles() -> String {
    format!(r#"{XML_DECL}<a:tblStyleLst xmlns:a="{NS_A}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#)
}

/// Office-style theme. `name` distinguishes the slide and notes themes.
pub fn theme(name: &str) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(r#"<a:theme xmlns:a="{NS_A}" name="{name}"><a:themeElements>"#));

    xml.push_str(r#"<a:clrScheme name="Office">"#);
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#);
    xml.push_str(r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    for (slot, rgb) in [
        ("dk2", "44546A"),
        ("lt2", "E7E6E6"),
        ("accent1", "4472C4"),
        ("accent2", "ED7D31"),
        ("accent3", "A5A5A5"),
        ("accent4", "FFC000"),
        ("accent5", "5B9BD5"),
        ("accent6", "70AD47"),
        ("hlink", "0563C1"),
        ("folHlink", "954F72"),
    ] {
        xml.push_str(&format!(r#"<a:{slot}><a:srgbClr val="{rgb}"/></a:{slot}>"#));
    }
    xml.push_str("</a:clrScheme>");

    xml.push_str(r#"<a:fontScheme name="Office">"#);
    xml.push_str(r#"<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#);
    xml.push_str(r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#);
    xml.push_str("</a:fontScheme>");

    xml.push_str(r#"<a:fmtScheme name="Office">"#);
    xml.push_str("<a:fillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:fillStyleLst>");
    xml.push_str("<a:lnStyleLst>");
    for width in [6350, 12700, 19050] {
        xml.push_str(&format!(
            r#"<a:ln w="{width}" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/><a:miter lim="800000"/></a:ln>"#
        ));
    }
    xml.push_str("</a:lnStyleLst>");
    xml.push_str("<a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst>");
    xml.push_str("<a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:bgFillStyleLst>");
    xml.push_str("</a:fmtScheme>");

    xml.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    xml
}
