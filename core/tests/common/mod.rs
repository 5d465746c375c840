#![allow(dead_code)]

use incident_alert_core::error::{CoreError, CoreResult};
use incident_alert_core::transport::{HttpResponse, HttpTransport};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::Value;
use std::cell::RefCell;
use std::time::Duration;
use url::Url;

/// Answers requests by URL prefix; anything unmatched is a connection error
/// naming the host. Every request is recorded.
#[derive(Default)]
pub struct FakeTransport {
    routes: Vec<(String, Reply)>,
    pub requests: RefCell<Vec<Request>>,
}

#[derive(Clone)]
pub enum Reply {
    Status(u16, Vec<u8>),
    Fail(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: &'static str,
    pub url: String,
    pub timeout: Duration,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: &str, reply: Reply) -> Self {
        self.routes.push((prefix.to_string(), reply));
        self
    }

    pub fn ok(self, prefix: &str, body: impl Into<Vec<u8>>) -> Self {
        self.route(prefix, Reply::Status(200, body.into()))
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|r| r.url.clone()).collect()
    }

    fn answer(&self, url: &Url) -> CoreResult<HttpResponse> {
        match self
            .routes
            .iter()
            .find(|(prefix, _)| url.as_str().starts_with(prefix.as_str()))
        {
            Some((_, Reply::Status(code, body))) => Ok(HttpResponse::new(*code, body.clone())),
            Some((_, Reply::Fail(msg))) => Err(CoreError::Network(msg.clone())),
            None => Err(CoreError::Network(format!(
                "{} connection refused",
                url.host_str().unwrap_or("")
            ))),
        }
    }
}

impl HttpTransport for FakeTransport {
    fn get(&self, url: &Url, timeout: Duration) -> CoreResult<HttpResponse> {
        self.requests.borrow_mut().push(Request {
            method: "GET",
            url: url.to_string(),
            timeout,
            body: None,
            bearer: None,
        });
        self.answer(url)
    }

    fn post_json(
        &self,
        url: &Url,
        body: &Value,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> CoreResult<HttpResponse> {
        self.requests.borrow_mut().push(Request {
            method: "POST",
            url: url.to_string(),
            timeout,
            body: Some(body.clone()),
            bearer: bearer.map(str::to_string),
        });
        self.answer(url)
    }
}

/// A PDF with one Helvetica text line per page.
pub fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let mut kids = Vec::new();
    for line in lines {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// A small PNG logo.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([20, 80, 160]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
