//! Multimodal prompt assembly and output cleanup

use regex::Regex;
use std::sync::OnceLock;

use crate::types::PageImage;

/// A single user turn: page images in retrieval rank order, then the question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionPrompt {
    /// Page images, best match first
    pub images: Vec<PageImage>,
    /// Question text, placed after all images
    pub text: String,
}

impl VisionPrompt {
    /// Build a prompt from ranked page images and the question
    pub fn new(images: Vec<PageImage>, question: impl Into<String>) -> Self {
        Self {
            images,
            text: question.into(),
        }
    }

    /// Base64 PNGs in prompt order
    pub fn encoded_images(&self) -> Vec<String> {
        self.images.iter().map(PageImage::to_base64).collect()
    }
}

fn special_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // <|im_end|>, <|endoftext|>, <|vision_start|>, ... plus bare <s> / </s>
        Regex::new(r"<\|[A-Za-z0-9_]+\|>|</?s>").expect("special token pattern is valid")
    })
}

/// Strip chat-template special tokens and surrounding whitespace
pub fn clean_generated_text(raw: &str) -> String {
    special_token_pattern().replace_all(raw, "").trim().to_string()
}
