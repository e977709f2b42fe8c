//! Tolerantes Dekodieren einzelner Felder

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Liest ein optionales Feld; falscher Typ oder `null` ergibt `None`
/// statt die ganze Nachricht zu verwerfen.
pub(crate) fn tolerant<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let wert = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(wert).ok())
}

/// Parst Rohdaten zu einem JSON-Objekt
pub(crate) fn json_objekt(
    raw: &[u8],
) -> crate::CodecResult<serde_json::Map<String, serde_json::Value>> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(crate::CodecError::Leer);
    }
    match serde_json::from_slice(raw)? {
        serde_json::Value::Object(objekt) => Ok(objekt),
        _ => Err(crate::CodecError::KeinObjekt),
    }
}
