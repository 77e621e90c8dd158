//! Fixture payloads for screening tests.

use sealgate_core::models::Label;
use sealgate_engine::{MemoryEngine, ProtectionEngine, ProtectionScheme};

pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n".to_vec()
}

pub fn png_bytes() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&[0u8; 24]);
    bytes
}

pub fn text_bytes() -> Vec<u8> {
    b"just some plain text".to_vec()
}

/// Catalog label of the given sensitivity.
pub fn label(engine: &MemoryEngine, sensitivity: i32) -> Label {
    engine
        .labels()
        .into_iter()
        .find(|l| l.sensitivity == sensitivity)
        .unwrap()
}

/// Pdf payload sealed under a template-based scheme.
pub fn sealed_pdf(engine: &MemoryEngine, sensitivity: i32) -> Vec<u8> {
    engine
        .seal(
            &pdf_bytes(),
            &label(engine, sensitivity),
            ProtectionScheme::TemplateBased,
        )
        .unwrap()
}

/// Pdf payload sealed under a custom (ad-hoc) scheme.
pub fn sealed_pdf_custom(engine: &MemoryEngine, sensitivity: i32) -> Vec<u8> {
    engine
        .seal(
            &pdf_bytes(),
            &label(engine, sensitivity),
            ProtectionScheme::Custom,
        )
        .unwrap()
}
