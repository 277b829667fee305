// src/services/subject_provider.rs

use std::{
    io::Cursor,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use base64::Engine;
use rand::Rng;
use url::Url;

use crate::{
    error::AppError,
    models::subject::{ApiPokemon, ImageRef, Subject},
};

/// Supplies one random subject per call.
///
/// A failure only affects the fetch in progress; callers may simply retry.
#[async_trait]
pub trait SubjectProvider: Send + Sync {
    async fn next(&self) -> Result<Subject, AppError>;
}

/// Fetches random Pokémon from the Tyradex API and desaturates their sprite.
pub struct HttpSubjectProvider {
    client: reqwest::Client,
    base_url: Url,
    max_id: u32,
}

impl HttpSubjectProvider {
    pub fn new(base_url: Url, max_id: u32) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url,
            max_id: max_id.max(1),
        })
    }

    fn random_id(&self) -> u32 {
        rand::thread_rng().gen_range(1..=self.max_id)
    }

    fn subject_url(&self, id: u32) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), id)
    }
}

#[async_trait]
impl SubjectProvider for HttpSubjectProvider {
    async fn next(&self) -> Result<Subject, AppError> {
        let id = self.random_id();
        let url = self.subject_url(id);
        tracing::debug!("Fetching subject {} from {}", id, url);

        let pokemon: ApiPokemon = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let sprite = self
            .client
            .get(&pokemon.sprites.regular)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let processed = tokio::task::spawn_blocking(move || desaturate_to_data_url(&sprite))
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))??;

        Ok(Subject {
            id: pokemon.pokedex_id,
            canonical_name: pokemon.name.fr,
            image_ref: ImageRef {
                original_url: pokemon.sprites.regular,
                processed,
            },
        })
    }
}

/// Converts an encoded image to grayscale (ITU-R 601 luma, alpha kept) and
/// returns it as a PNG data URL.
pub fn desaturate_to_data_url(bytes: &[u8]) -> Result<String, AppError> {
    let mut img = image::load_from_memory(bytes)?.to_rgba8();

    for pixel in img.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let gray = (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64).round() as u8;
        pixel.0 = [gray, gray, gray, a];
    }

    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)?;

    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&png)
    ))
}

/// Serves a fixed list of subjects in order, wrapping around.
/// Can be switched into a failing mode to exercise provider errors.
pub struct FixedSubjectProvider {
    subjects: Vec<Subject>,
    cursor: AtomicUsize,
    failing: AtomicBool,
}

impl FixedSubjectProvider {
    pub fn new(subjects: Vec<Subject>) -> Self {
        Self {
            subjects,
            cursor: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Builds subjects with placeholder images from a list of names.
    pub fn from_names(names: &[&str]) -> Self {
        let subjects = names
            .iter()
            .enumerate()
            .map(|(i, name)| Subject {
                id: i as i64 + 1,
                canonical_name: name.to_string(),
                image_ref: ImageRef {
                    original_url: format!("fixed://{}", i + 1),
                    processed: format!("fixed://{}/gray", i + 1),
                },
            })
            .collect();
        Self::new(subjects)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubjectProvider for FixedSubjectProvider {
    async fn next(&self) -> Result<Subject, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ProviderError("provider switched off".to_string()));
        }
        if self.subjects.is_empty() {
            return Err(AppError::ProviderError("no subjects configured".to_string()));
        }
        let i = self.cursor.fetch_add(1, Ordering::SeqCst);
        Ok(self.subjects[i % self.subjects.len()].clone())
    }
}
