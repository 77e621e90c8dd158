//! File-type signature table
//!
//! Maps an upload extension to the magic-number signatures its content must
//! start with. A signature is a set of segments that must all match at their
//! offsets; an extension with several signatures accepts any one of them.

use std::collections::HashMap;
use std::sync::LazyLock;

/// One contiguous run of required bytes at a fixed offset
#[derive(Debug, Clone, Copy)]
pub struct HeaderSegment {
    pub offset: usize,
    pub bytes: &'static [u8],
}

/// A complete signature for one file format
#[derive(Debug, Clone, Copy)]
pub struct FileHeaderEntry {
    pub mime_type: &'static str,
    pub segments: &'static [HeaderSegment],
}

// Version digits after "%PDF-" vary and are not part of the signature.
static PDF: &[FileHeaderEntry] = &[FileHeaderEntry {
    mime_type: "application/pdf",
    segments: &[HeaderSegment {
        offset: 0,
        bytes: b"%PDF-",
    }],
}];

static ZIP: &[FileHeaderEntry] = &[FileHeaderEntry {
    mime_type: "application/zip",
    segments: &[HeaderSegment {
        offset: 0,
        bytes: b"PK\x03\x04",
    }],
}];

// OOXML documents are zip containers and share the local-file signature.
static DOCX: &[FileHeaderEntry] = &[FileHeaderEntry {
    mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    segments: &[HeaderSegment {
        offset: 0,
        bytes: b"PK\x03\x04",
    }],
}];

static JPG: &[FileHeaderEntry] = &[FileHeaderEntry {
    mime_type: "image/jpeg",
    segments: &[HeaderSegment {
        offset: 0,
        bytes: b"\xFF\xD8\xFF",
    }],
}];

static PNG: &[FileHeaderEntry] = &[FileHeaderEntry {
    mime_type: "image/png",
    segments: &[HeaderSegment {
        offset: 0,
        bytes: b"\x89PNG\r\n\x1a\n",
    }],
}];

static GIF: &[FileHeaderEntry] = &[FileHeaderEntry {
    mime_type: "image/gif",
    segments: &[HeaderSegment {
        offset: 0,
        bytes: b"GIF8",
    }],
}];

static BMP: &[FileHeaderEntry] = &[FileHeaderEntry {
    mime_type: "image/bmp",
    segments: &[HeaderSegment {
        offset: 0,
        bytes: b"BM",
    }],
}];

// RIFF container whose form tag at offset 8 must also read WEBP.
static WEBP: &[FileHeaderEntry] = &[FileHeaderEntry {
    mime_type: "image/webp",
    segments: &[
        HeaderSegment {
            offset: 0,
            bytes: b"RIFF",
        },
        HeaderSegment {
            offset: 8,
            bytes: b"WEBP",
        },
    ],
}];

static SVG: &[FileHeaderEntry] = &[FileHeaderEntry {
    mime_type: "image/svg+xml",
    segments: &[HeaderSegment {
        offset: 0,
        bytes: b"<?xml",
    }],
}];

static TABLE: &[(&str, &[FileHeaderEntry])] = &[
    (".pdf", PDF),
    (".zip", ZIP),
    (".docx", DOCX),
    (".jpg", JPG),
    (".png", PNG),
    (".gif", GIF),
    (".bmp", BMP),
    (".webp", WEBP),
    (".svg", SVG),
];

pub static FILE_HEADERS: LazyLock<HashMap<&'static str, &'static [FileHeaderEntry]>> =
    LazyLock::new(|| TABLE.iter().copied().collect());

/// Signatures registered for `extension` (leading dot, any case).
pub fn entries_for(extension: &str) -> Option<&'static [FileHeaderEntry]> {
    FILE_HEADERS.get(extension.to_lowercase().as_str()).copied()
}

/// Every registered signature, in table order.
pub fn all_entries() -> impl Iterator<Item = &'static FileHeaderEntry> {
    TABLE.iter().flat_map(|(_, entries)| entries.iter())
}
