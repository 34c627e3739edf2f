// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owned element tree for sidecar XML.
//!
//! Sidecars are small documents that get read, surgically edited, and
//! written back pretty-printed, so an owned tree beats streaming here.
//! Parsing goes through quick-xml; comments and processing instructions in
//! an existing file are dropped on read and a single timestamped comment is
//! re-inserted under the root on write.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NfoError {
    #[error("malformed XML: {0}")]
    Parse(String),
}

/// One XML element: tag, attributes, text content, and child elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(tag);
        element.text = text.into();
        element
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Append a child and return a handle to it.
    pub fn add_child(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Append an empty child tag.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> &mut Element {
        self.add_child(Element::new(tag))
    }

    /// Append a text-only child tag.
    pub fn add_text_tag(
        &mut self,
        tag: impl Into<String>,
        text: impl Into<String>,
    ) -> &mut Element {
        self.add_child(Element::with_text(tag, text))
    }

    /// Replace every same-named child with a single text tag.
    pub fn set_tag(&mut self, tag: &str, text: impl Into<String>) -> &mut Element {
        self.children.retain(|c| c.tag != tag);
        self.add_text_tag(tag, text)
    }

    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn find_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.tag == tag)
    }

    /// First matching child by predicate.
    pub fn find_where(&self, pred: impl Fn(&Element) -> bool) -> Option<&Element> {
        self.children.iter().find(|c| pred(c))
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    pub fn any_matching(&self, pred: impl Fn(&Element) -> bool) -> bool {
        self.children.iter().any(|c| pred(c))
    }

    /// Remove matching children, returning how many were removed.
    pub fn remove_matching(&mut self, pred: impl Fn(&Element) -> bool) -> usize {
        let before = self.children.len();
        self.children.retain(|c| !pred(c));
        before - self.children.len()
    }

    /// Remove matching children and hand them back.
    pub fn take_matching(&mut self, pred: impl Fn(&Element) -> bool) -> Vec<Element> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.children.len());
        for child in self.children.drain(..) {
            if pred(&child) {
                taken.push(child);
            } else {
                kept.push(child);
            }
        }
        self.children = kept;
        taken
    }

    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.find(tag).map(Element::text)
    }

    /// Parse a document into its root element.
    pub fn parse(xml: &str) -> Result<Element, NfoError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Err(e) => return Err(NfoError::Parse(e.to_string())),
                Ok(Event::Eof) => break,
                Ok(Event::Start(start)) => stack.push(element_from(&start)?),
                Ok(Event::Empty(start)) => {
                    let element = element_from(&start)?;
                    attach(element, &mut stack, &mut root)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| NfoError::Parse("unbalanced end tag".to_string()))?;
                    attach(element, &mut stack, &mut root)?;
                }
                Ok(Event::Text(text)) => {
                    if let Some(top) = stack.last_mut() {
                        let unescaped = text
                            .unescape()
                            .map_err(|e| NfoError::Parse(e.to_string()))?;
                        top.text.push_str(&unescaped);
                    }
                }
                Ok(Event::CData(data)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text
                            .push_str(&String::from_utf8_lossy(data.as_ref()));
                    }
                }
                // Comments, declarations, and PIs are not carried over.
                Ok(_) => {}
            }
        }

        if !stack.is_empty() {
            return Err(NfoError::Parse("unclosed element".to_string()));
        }
        root.ok_or_else(|| NfoError::Parse("no root element".to_string()))
    }

    /// Serialize pretty-printed with a declaration; `comment` is inserted
    /// as the first line under the root.
    pub fn to_xml(&self, comment: Option<&str>) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.write_into(&mut out, 0, comment);
        out
    }

    fn write_into(&self, out: &mut String, level: usize, comment: Option<&str>) {
        let indent = "    ".repeat(level);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push('"');
        }

        let empty = self.text.is_empty() && self.children.is_empty() && comment.is_none();
        if empty {
            out.push_str("/>\n");
            return;
        }

        if self.children.is_empty() && comment.is_none() {
            out.push('>');
            out.push_str(&escape(&self.text));
            out.push_str("</");
            out.push_str(&self.tag);
            out.push_str(">\n");
            return;
        }

        out.push_str(">\n");
        let inner_indent = "    ".repeat(level + 1);
        if let Some(comment) = comment {
            out.push_str(&inner_indent);
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->\n");
        }
        if !self.text.is_empty() {
            out.push_str(&inner_indent);
            out.push_str(&escape(&self.text));
            out.push('\n');
        }
        for child in &self.children {
            child.write_into(out, level + 1, None);
        }
        out.push_str(&indent);
        out.push_str("</");
        out.push_str(&self.tag);
        out.push_str(">\n");
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, NfoError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| NfoError::Parse(e.to_string()))?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| NfoError::Parse(e.to_string()))?
            .into_owned();
        element.attrs.push((name, value));
    }
    Ok(element)
}

fn attach(
    element: Element,
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
) -> Result<(), NfoError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(NfoError::Parse("multiple root elements".to_string())),
    }
}

#[cfg(test)]
#[path = "nfo_tests.rs"]
mod tests;
