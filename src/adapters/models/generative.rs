//! Deterministic generative models.

use std::io::Cursor;

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};

use super::digest_stream;
use crate::domain::models::{ModelOutput, OutputModality};
use crate::domain::ports::GenerativeModel;

/// Side length of generated images.
const IMAGE_SIZE: u32 = 64;

/// Text-to-image model producing a PNG whose pixels derive from the input.
///
/// Pure in (input, seed): identical prompts under the same seed render the
/// same image.
#[derive(Debug, Default)]
pub struct DummyTextToImage;

#[async_trait]
impl GenerativeModel for DummyTextToImage {
    fn name(&self) -> &str {
        "dummy-t2i"
    }

    fn modality(&self) -> OutputModality {
        OutputModality::Image
    }

    async fn generate(&self, input: &ModelOutput, seed: u64) -> Result<ModelOutput> {
        let text = input
            .as_text()
            .context("dummy-t2i expects text input")?;

        let mut material = text.as_bytes().to_vec();
        material.extend_from_slice(&seed.to_le_bytes());
        let pixels = digest_stream(&material, (IMAGE_SIZE * IMAGE_SIZE * 3) as usize);

        let image = RgbImage::from_fn(IMAGE_SIZE, IMAGE_SIZE, |x, y| {
            let offset = ((y * IMAGE_SIZE + x) * 3) as usize;
            Rgb([pixels[offset], pixels[offset + 1], pixels[offset + 2]])
        });

        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageFormat::Png)
            .context("failed to encode generated image")?;
        Ok(ModelOutput::image(buffer.into_inner()))
    }
}

/// Text-to-text model rewriting its input into a digest-derived phrase.
///
/// Pure in (input, seed). Lets experiments express single-model all-text
/// networks.
#[derive(Debug, Default)]
pub struct DummyTextToText;

#[async_trait]
impl GenerativeModel for DummyTextToText {
    fn name(&self) -> &str {
        "dummy-t2t"
    }

    fn modality(&self) -> OutputModality {
        OutputModality::Text
    }

    async fn generate(&self, input: &ModelOutput, seed: u64) -> Result<ModelOutput> {
        let text = input
            .as_text()
            .context("dummy-t2t expects text input")?;

        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(seed.to_le_bytes());
        let digest = hasher.finalize();

        Ok(ModelOutput::text(format!(
            "a retelling of {:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5]
        )))
    }
}

/// Image-to-text model captioning an image by its content digest.
///
/// Pure in (input, seed): identical image bytes under the same seed caption
/// identically, so chains over the dummy pair are fully reproducible.
#[derive(Debug, Default)]
pub struct DummyImageToText;

#[async_trait]
impl GenerativeModel for DummyImageToText {
    fn name(&self) -> &str {
        "dummy-i2t"
    }

    fn modality(&self) -> OutputModality {
        OutputModality::Text
    }

    async fn generate(&self, input: &ModelOutput, seed: u64) -> Result<ModelOutput> {
        let bytes = input
            .as_image()
            .context("dummy-i2t expects image input")?;

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hasher.update(seed.to_le_bytes());
        let digest = hasher.finalize();

        Ok(ModelOutput::text(format!(
            "an abstract composition, motif {:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5]
        )))
    }
}
