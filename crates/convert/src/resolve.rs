//! Reference resolution.
//!
//! The document is parsed into an owned DOM and walked once in document
//! order. Image sources and the first stylesheet link found in the archive
//! are materialized, handed to the book writer, and the image sources are
//! rewritten to the writer's internal references. Anything that cannot be
//! resolved is left pointing where it did.

use crate::error::{ErrorKind, Result};
use crate::naming::{local_name, stylesheet_name};
use exn::{OptionExt, ResultExt};
use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::{Attribute, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use mhtpub_archive::{Kind, Part, PartIndex};
use mhtpub_book::{BookWriter, Source};
use std::cell::RefCell;
use tracing::instrument;

/// Image attributes that could point at variants missing from the archive.
const DROPPED_IMAGE_ATTRIBUTES: [&str; 2] = ["loading", "srcset"];
const STYLESHEET_TYPE: &str = "text/css";

/// The parts of a document that become a book section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Text of the first `<title>`, empty if there is none.
    pub title: String,
    /// Inner markup of `<body>` with image references rewritten, empty if
    /// the document has no body (a frameset page, for one).
    pub body: String,
    /// Internal reference of the stylesheet, if the first one resolved.
    pub stylesheet: Option<String>,
}

/// Resolves the references of `document` against `index`, registering every
/// resolved resource with `writer`.
///
/// Unresolvable references are logged and skipped.
///
/// # Errors
///
/// - [`ErrorKind::MarkupExtraction`] if the body cannot be serialized
#[instrument(skip_all, fields(document_size = document.body().len(), images, stylesheet))]
pub fn resolve<W: BookWriter + ?Sized>(document: &Part, index: &mut PartIndex, writer: &mut W) -> Result<Resolved> {
    let dom = parse_document(RcDom::default(), Default::default()).from_utf8().one(document.body());
    let mut title = None;
    let mut body = None;
    let mut stylesheet_seen = false;
    let mut stylesheet = None;
    let mut images = 0usize;

    for node in elements(&dom.document) {
        let NodeData::Element { name, attrs, .. } = &node.data else {
            continue;
        };
        match &*name.local {
            "img" => {
                if resolve_image(attrs, index, writer) {
                    images += 1;
                }
            },
            // Later links are not tried, even when this one does not resolve.
            "link" if !stylesheet_seen && attribute(attrs, "type").as_deref() == Some(STYLESHEET_TYPE) => {
                stylesheet_seen = true;
                stylesheet = resolve_stylesheet(attrs, index, writer);
            },
            "title" if title.is_none() => title = Some(text_content(&node)),
            "body" if body.is_none() => body = Some(node.clone()),
            _ => {},
        }
    }

    let span = tracing::Span::current();
    span.record("images", images);
    span.record("stylesheet", stylesheet.is_some());

    let body = match body {
        Some(body) => inner_html(body)?,
        None => {
            tracing::debug!("Document has no body; section is empty");
            String::new()
        },
    };
    Ok(Resolved { title: title.unwrap_or_default(), body, stylesheet })
}

/// Returns `true` if the image source was rewritten.
fn resolve_image<W: BookWriter + ?Sized>(attrs: &RefCell<Vec<Attribute>>, index: &mut PartIndex, writer: &mut W) -> bool {
    attrs.borrow_mut().retain(|attr| !DROPPED_IMAGE_ATTRIBUTES.contains(&&*attr.name.local));
    let Some(src) = attribute(attrs, "src") else {
        return false;
    };
    match image_reference(&src, index, writer) {
        Ok(Some(reference)) => {
            tracing::trace!(src = src.as_str(), reference = reference.as_str(), "Resolved image");
            set_attribute(attrs, "src", &reference);
            true
        },
        Ok(None) => {
            tracing::debug!(src = src.as_str(), "Image not in archive; left unchanged");
            false
        },
        Err(err) => {
            let reason: &ErrorKind = &err;
            tracing::warn!(src = src.as_str(), %reason, "Cannot resolve image; left unchanged");
            false
        },
    }
}

fn image_reference<W: BookWriter + ?Sized>(src: &str, index: &mut PartIndex, writer: &mut W) -> Result<Option<String>> {
    let Some(part) = index.get_mut(src) else {
        return Ok(None);
    };
    let resource = part.materialize().map_err(ErrorKind::archive)?;
    let kind = resource.kind().filter(Kind::is_image).ok_or_raise(|| ErrorKind::Resource(src.to_string()))?;
    let name = local_name(src, kind);
    let reference = writer.add_image(Source::Temporary(resource.handle()), &name).map_err(ErrorKind::book)?;
    Ok(Some(reference))
}

fn resolve_stylesheet<W: BookWriter + ?Sized>(
    attrs: &RefCell<Vec<Attribute>>,
    index: &mut PartIndex,
    writer: &mut W,
) -> Option<String> {
    let href = attribute(attrs, "href")?;
    match stylesheet_reference(&href, index, writer) {
        Ok(Some(reference)) => {
            tracing::debug!(href = href.as_str(), reference = reference.as_str(), "Resolved stylesheet");
            Some(reference)
        },
        Ok(None) => {
            tracing::debug!(href = href.as_str(), "Stylesheet not in archive; section has no stylesheet");
            None
        },
        Err(err) => {
            let reason: &ErrorKind = &err;
            tracing::warn!(href = href.as_str(), %reason, "Cannot resolve stylesheet; section has no stylesheet");
            None
        },
    }
}

fn stylesheet_reference<W: BookWriter + ?Sized>(href: &str, index: &mut PartIndex, writer: &mut W) -> Result<Option<String>> {
    let Some(part) = index.get_mut(href) else {
        return Ok(None);
    };
    let resource = part.materialize().map_err(ErrorKind::archive)?;
    let name = stylesheet_name(href);
    let reference = writer.add_stylesheet(Source::Temporary(resource.handle()), &name).map_err(ErrorKind::book)?;
    Ok(Some(reference))
}

/// Every element below `root`, in document order.
fn elements(root: &Handle) -> Vec<Handle> {
    let mut found = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if matches!(node.data, NodeData::Element { .. }) {
            found.push(node.clone());
        }
        stack.extend(node.children.borrow().iter().rev().cloned());
    }
    found
}

fn attribute(attrs: &RefCell<Vec<Attribute>>, name: &str) -> Option<String> {
    attrs.borrow().iter().find(|attr| &*attr.name.local == name).map(|attr| attr.value.to_string())
}

fn set_attribute(attrs: &RefCell<Vec<Attribute>>, name: &str, value: &str) {
    if let Some(attr) = attrs.borrow_mut().iter_mut().find(|attr| &*attr.name.local == name) {
        attr.value = value.into();
    }
}

fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    let mut stack = vec![node.clone()];
    while let Some(node) = stack.pop() {
        if let NodeData::Text { contents } = &node.data {
            text.push_str(&contents.borrow());
        }
        stack.extend(node.children.borrow().iter().rev().cloned());
    }
    text
}

fn inner_html(node: Handle) -> Result<String> {
    let mut html = Vec::new();
    let opts = SerializeOpts { traversal_scope: TraversalScope::ChildrenOnly(None), ..Default::default() };
    serialize(&mut html, &SerializableHandle::from(node), opts).or_raise(|| ErrorKind::MarkupExtraction)?;
    String::from_utf8(html).or_raise(|| ErrorKind::MarkupExtraction)
}
