//! User-facing message catalogue.
//!
//! Messages are addressed by a closed [`MessageKey`] and resolved with an
//! exhaustive `match` per language, so adding a key without translating it
//! fails to compile.

use std::{fmt, str::FromStr};

use serde::Serialize;

/// Interface language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    /// Accepts a bare code or a locale such as `es_ES.UTF-8`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s
            .split(['_', '-', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match code.as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            _ => Err(format!("unsupported language '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    ImageLoadFailed,
    InvalidPath,
    InvalidBoundingBox,
    ImageSaveFailed,
    InvalidApiKey,
    RateLimited,
    RequestFailed,
    NetworkUnavailable,
    UnexpectedResponse,
    FileSystemError,
    InvalidConfiguration,
    NoObjectsFound,
    CutoutSaved,
    CacheCleared,
}

impl MessageKey {
    pub const ALL: [MessageKey; 14] = [
        MessageKey::ImageLoadFailed,
        MessageKey::InvalidPath,
        MessageKey::InvalidBoundingBox,
        MessageKey::ImageSaveFailed,
        MessageKey::InvalidApiKey,
        MessageKey::RateLimited,
        MessageKey::RequestFailed,
        MessageKey::NetworkUnavailable,
        MessageKey::UnexpectedResponse,
        MessageKey::FileSystemError,
        MessageKey::InvalidConfiguration,
        MessageKey::NoObjectsFound,
        MessageKey::CutoutSaved,
        MessageKey::CacheCleared,
    ];
}

pub fn translate(language: Language, key: MessageKey) -> &'static str {
    match language {
        Language::En => english(key),
        Language::Es => spanish(key),
    }
}

fn english(key: MessageKey) -> &'static str {
    match key {
        MessageKey::ImageLoadFailed => "Could not open the image.",
        MessageKey::InvalidPath => "The segmentation outline could not be read.",
        MessageKey::InvalidBoundingBox => "The selected area is empty.",
        MessageKey::ImageSaveFailed => "Could not save the image.",
        MessageKey::InvalidApiKey => "Invalid API key.",
        MessageKey::RateLimited => "Too many requests. Please wait and try again.",
        MessageKey::RequestFailed => "The request failed.",
        MessageKey::NetworkUnavailable => "Could not reach the vision service.",
        MessageKey::UnexpectedResponse => "The vision service sent an unexpected response.",
        MessageKey::FileSystemError => "A file operation failed.",
        MessageKey::InvalidConfiguration => "The configuration is invalid.",
        MessageKey::NoObjectsFound => "No objects found.",
        MessageKey::CutoutSaved => "Cutout saved.",
        MessageKey::CacheCleared => "Cache cleared.",
    }
}

fn spanish(key: MessageKey) -> &'static str {
    match key {
        MessageKey::ImageLoadFailed => "No se pudo abrir la imagen.",
        MessageKey::InvalidPath => "No se pudo leer el contorno de la segmentación.",
        MessageKey::InvalidBoundingBox => "El área seleccionada está vacía.",
        MessageKey::ImageSaveFailed => "No se pudo guardar la imagen.",
        MessageKey::InvalidApiKey => "Clave de API no válida.",
        MessageKey::RateLimited => "Demasiadas solicitudes. Espera e inténtalo de nuevo.",
        MessageKey::RequestFailed => "La solicitud falló.",
        MessageKey::NetworkUnavailable => "No se pudo conectar con el servicio de visión.",
        MessageKey::UnexpectedResponse => "El servicio de visión envió una respuesta inesperada.",
        MessageKey::FileSystemError => "Falló una operación de archivo.",
        MessageKey::InvalidConfiguration => "La configuración no es válida.",
        MessageKey::NoObjectsFound => "No se encontraron objetos.",
        MessageKey::CutoutSaved => "Recorte guardado.",
        MessageKey::CacheCleared => "Caché vaciada.",
    }
}
