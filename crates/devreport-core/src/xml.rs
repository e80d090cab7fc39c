//! The report sink and its XML rendering.

use std::fmt::{self, Write as _};

use base64::Engine;

/// Hierarchical element writer the probe sequences emit into.
///
/// Callers keep start/end calls balanced; attributes may only follow a
/// `start_element` directly.
pub trait ReportSink {
    fn start_element(&mut self, name: &str);
    fn end_element(&mut self);
    fn write_element(&mut self, name: &str, value: &str);
    fn write_formatted(&mut self, name: &str, value: fmt::Arguments<'_>);
    /// Base64 text content of the current element.
    fn write_base64(&mut self, bytes: &[u8]);
    fn write_attribute(&mut self, name: &str, value: &str);
    fn write_comment(&mut self, text: &str);

    fn write_bool(&mut self, name: &str, value: bool) {
        self.write_element(name, if value { "true" } else { "false" });
    }

    /// An element holding `bytes` as base64.
    fn write_data(&mut self, name: &str, bytes: &[u8]) {
        self.start_element(name);
        self.write_base64(bytes);
        self.end_element();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Content {
    Empty,
    Text,
    Elements,
}

/// Renders into an in-memory, indented XML document.
#[derive(Debug)]
pub struct XmlWriter {
    out: String,
    open: Vec<(String, Content)>,
    tag_pending: bool,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            out: String::from(r#"<?xml version="1.0" encoding="utf-8"?>"#),
            open: Vec::new(),
            tag_pending: false,
        }
    }

    /// Close whatever is still open and return the document.
    pub fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.end_element();
        }
        self.out.push('\n');
        self.out
    }

    fn close_pending_tag(&mut self) {
        if self.tag_pending {
            self.out.push('>');
            self.tag_pending = false;
        }
    }

    fn new_line(&mut self) {
        self.out.push('\n');
        for _ in 0..self.open.len() {
            self.out.push_str("  ");
        }
    }

    fn child_started(&mut self) {
        self.close_pending_tag();
        if let Some((_, content)) = self.open.last_mut() {
            *content = Content::Elements;
        }
        self.new_line();
    }

    fn text(&mut self, text: &str) {
        self.close_pending_tag();
        if let Some((_, content)) = self.open.last_mut() {
            *content = Content::Text;
        }
        self.out.push_str(&escape(text));
    }
}

impl ReportSink for XmlWriter {
    fn start_element(&mut self, name: &str) {
        self.child_started();
        self.out.push('<');
        self.out.push_str(name);
        self.open.push((name.to_string(), Content::Empty));
        self.tag_pending = true;
    }

    fn end_element(&mut self) {
        let Some((name, content)) = self.open.pop() else {
            log::warn!("report sink: end_element without an open element");
            return;
        };
        match content {
            Content::Empty if self.tag_pending => {
                self.out.push_str(" />");
                self.tag_pending = false;
                return;
            }
            Content::Elements => self.new_line(),
            _ => self.close_pending_tag(),
        }
        let _ = write!(self.out, "</{name}>");
    }

    fn write_element(&mut self, name: &str, value: &str) {
        self.start_element(name);
        self.text(value);
        self.end_element();
    }

    fn write_formatted(&mut self, name: &str, value: fmt::Arguments<'_>) {
        self.write_element(name, &value.to_string());
    }

    fn write_base64(&mut self, bytes: &[u8]) {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.text(&encoded);
    }

    fn write_attribute(&mut self, name: &str, value: &str) {
        if !self.tag_pending {
            log::warn!("report sink: attribute {name} written outside a start tag");
            return;
        }
        let _ = write!(self.out, r#" {name}="{}""#, escape(value));
    }

    fn write_comment(&mut self, text: &str) {
        self.child_started();
        let _ = write!(self.out, "<!-- {} -->", text.replace("--", "- -"));
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() && c != '\n' && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_document() {
        let mut xml = XmlWriter::new();
        xml.write_comment("written by test");
        xml.start_element("DeviceReport");
        xml.start_element("ATA");
        xml.write_element("Model", "A&B <disk>");
        xml.write_bool("Removable", false);
        xml.write_formatted("BlockSize", format_args!("{}", 512));
        xml.start_element("EVPD");
        xml.write_attribute("page", "0x80");
        xml.write_base64(b"hi");
        xml.end_element();
        xml.start_element("Empty");
        xml.end_element();
        xml.end_element();
        xml.end_element();

        assert_eq!(
            xml.finish(),
            concat!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n",
                "<!-- written by test -->\n",
                "<DeviceReport>\n",
                "  <ATA>\n",
                "    <Model>A&amp;B &lt;disk&gt;</Model>\n",
                "    <Removable>false</Removable>\n",
                "    <BlockSize>512</BlockSize>\n",
                "    <EVPD page=\"0x80\">aGk=</EVPD>\n",
                "    <Empty />\n",
                "  </ATA>\n",
                "</DeviceReport>\n",
            )
        );
    }

    #[test]
    fn finish_closes_open_elements() {
        let mut xml = XmlWriter::new();
        xml.start_element("DeviceReport");
        xml.start_element("SCSI");
        xml.write_element("Vendor", "X");
        let doc = xml.finish();
        assert!(doc.ends_with("  </SCSI>\n</DeviceReport>\n"));
    }

    #[test]
    fn stray_attribute_is_dropped() {
        let mut xml = XmlWriter::new();
        xml.start_element("A");
        xml.write_element("B", "1");
        xml.write_attribute("late", "x");
        xml.end_element();
        assert!(!xml.finish().contains("late"));
    }
}
