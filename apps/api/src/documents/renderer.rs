//! Document renderer collaborator.
//!
//! The core only requires "PDF-like" and "DOCX-like" artifacts from validated
//! text fields; rendering internals are not part of the request pipeline.
//! [`BasicRenderer`] is a dependency-free implementation of the seam, and the
//! trait lets a richer engine replace it without touching the handlers.

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Cv,
    Cover,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Cv,
    CoverLetter,
}

/// Validated, sanitized text fields the renderer works from.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub work_experience: String,
    pub education: String,
    pub skills: String,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, kind: DocumentKind, input: &DocumentInput) -> Result<RenderedDocument>;
}

/// Minimal built-in renderer: a single-page PDF for the CV and a Word-XML
/// document for the cover letter.
pub struct BasicRenderer;

impl DocumentRenderer for BasicRenderer {
    fn render(&self, kind: DocumentKind, input: &DocumentInput) -> Result<RenderedDocument> {
        match kind {
            DocumentKind::Cv => {
                let mut lines = vec!["Curriculum Vitae".to_string(), String::new()];
                for (heading, text) in [
                    ("Work Experience", &input.work_experience),
                    ("Education", &input.education),
                    ("Skills", &input.skills),
                ] {
                    lines.push(heading.to_string());
                    lines.extend(text.lines().map(str::to_string));
                    lines.push(String::new());
                }
                Ok(RenderedDocument {
                    filename: "cv.pdf".to_string(),
                    content_type: "application/pdf",
                    bytes: build_pdf(&lines),
                })
            }
            DocumentKind::CoverLetter => {
                let body = format!(
                    "Dear Hiring Manager,\n\n\
                     I am writing to express my interest in this role. My background:\n\n\
                     {}\n\nEducation:\n{}\n\nKey skills:\n{}\n\n\
                     Thank you for your consideration.",
                    input.work_experience, input.education, input.skills
                );
                Ok(RenderedDocument {
                    filename: "cover_letter.doc".to_string(),
                    content_type: "application/msword",
                    bytes: build_word_xml("Cover Letter", &body),
                })
            }
        }
    }
}

/// Assembles a minimal valid single-page PDF with the given text lines.
fn build_pdf(lines: &[String]) -> Vec<u8> {
    let mut content = String::from("BT /F1 11 Tf 50 770 Td 14 TL\n");
    for line in lines {
        content.push_str(&format!("({}) Tj T*\n", escape_pdf_text(line)));
    }
    content.push_str("ET\n");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!("<< /Length {} >>\nstream\n{}endstream", content.len(), content),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_start = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_start
    ));

    out.into_bytes()
}

fn escape_pdf_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Word-XML container (readable by Word as a .doc): one paragraph per line.
fn build_word_xml(title: &str, body: &str) -> Vec<u8> {
    let mut paragraphs = String::new();
    paragraphs.push_str(&format!(
        "<w:p><w:r><w:t>{}</w:t></w:r></w:p>",
        escape_xml(title)
    ));
    for line in body.lines() {
        paragraphs.push_str(&format!(
            "<w:p><w:r><w:t>{}</w:t></w:r></w:p>",
            escape_xml(line)
        ));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <?mso-application progid=\"Word.Document\"?>\
         <w:wordDocument xmlns:w=\"http://schemas.microsoft.com/office/word/2003/wordml\">\
         <w:body>{paragraphs}</w:body></w:wordDocument>"
    )
    .into_bytes()
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
