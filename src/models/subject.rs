// src/models/subject.rs

use serde::{Deserialize, Serialize};

/// The creature the player has to identify in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,

    /// Name answers are compared against.
    pub canonical_name: String,

    pub image_ref: ImageRef,
}

/// Image handles for a subject. Opaque to the quiz core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Where the untouched sprite was fetched from.
    pub original_url: String,

    /// The desaturated image shown to the player (usually a `data:` URL).
    pub processed: String,
}

/// Raw payload of the Tyradex `/pokemon/{id}` endpoint.
/// Only the fields the quiz needs are mapped.
#[derive(Debug, Deserialize)]
pub struct ApiPokemon {
    pub pokedex_id: i64,
    pub name: ApiNames,
    pub sprites: ApiSprites,
}

#[derive(Debug, Deserialize)]
pub struct ApiNames {
    pub fr: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiSprites {
    pub regular: String,
}
