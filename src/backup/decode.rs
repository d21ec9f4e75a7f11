//! Converte lo snapshot grezzo in record tipizzati prima di qualsiasi scrittura.

use crate::error::{AppError, AppResult};
use crate::services::validation::{
    optional_non_negative, require_non_negative, require_text,
};
use crate::storage::repository::{CreateBolla, CreateCliente, CreatePozzo};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const AUDIT_FIELDS: [&str; 4] = ["_id", "__v", "createdAt", "updatedAt"];

#[derive(Debug)]
pub struct PendingPozzo {
    pub old_id: String,
    pub def: CreatePozzo,
}

#[derive(Debug)]
pub struct PendingCliente {
    pub old_id: String,
    /// Id dei pozzi così come compaiono nello snapshot.
    pub old_pozzi_ids: Vec<String>,
    pub def: CreateCliente,
}

#[derive(Debug)]
pub struct PendingBolla {
    pub old_cliente_id: String,
    pub old_pozzo_id: String,
    pub def: CreateBolla,
}

#[derive(Debug)]
pub struct DecodedSnapshot {
    pub pozzi: Vec<PendingPozzo>,
    pub clienti: Vec<PendingCliente>,
    pub bolle: Vec<PendingBolla>,
}

impl DecodedSnapshot {
    pub fn from_value(raw: &Value) -> AppResult<Self> {
        if raw.get("version").map_or(true, Value::is_null) {
            return Err(AppError::validation("Formato backup non valido: version mancante"));
        }
        let data = raw
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| AppError::validation("Formato backup non valido: data mancante"))?;

        let pozzi = collection(data, "pozzi")?
            .iter()
            .enumerate()
            .map(|(i, v)| decode_pozzo(i, v))
            .collect::<AppResult<Vec<_>>>()?;
        let clienti = collection(data, "clienti")?
            .iter()
            .enumerate()
            .map(|(i, v)| decode_cliente(i, v))
            .collect::<AppResult<Vec<_>>>()?;
        let bolle = collection(data, "bolle")?
            .iter()
            .enumerate()
            .map(|(i, v)| decode_bolla(i, v))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            pozzi,
            clienti,
            bolle,
        })
    }
}

/// Estrae l'id da una stringa, da un documento annidato o da un `$oid` in extended JSON.
pub fn reference_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => obj
            .get("$oid")
            .or_else(|| obj.get("_id"))
            .and_then(reference_id),
        _ => None,
    }
}

fn collection<'a>(data: &'a Map<String, Value>, name: &str) -> AppResult<&'a Vec<Value>> {
    data.get(name).and_then(Value::as_array).ok_or_else(|| {
        AppError::validation(format!(
            "Il backup deve contenere pozzi, clienti e bolle ({name} mancante)"
        ))
    })
}

fn record<'a>(collection: &str, index: usize, raw: &'a Value) -> AppResult<&'a Map<String, Value>> {
    raw.as_object()
        .ok_or_else(|| AppError::validation(format!("{collection}[{index}]: non è un oggetto")))
}

fn old_id(collection: &str, index: usize, obj: &Map<String, Value>) -> AppResult<String> {
    obj.get("_id")
        .and_then(reference_id)
        .ok_or_else(|| AppError::validation(format!("{collection}[{index}]: _id mancante")))
}

fn strip_audit(obj: &Map<String, Value>) -> Map<String, Value> {
    obj.iter()
        .filter(|(k, _)| !AUDIT_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn typed<T: DeserializeOwned>(collection: &str, index: usize, fields: Map<String, Value>) -> AppResult<T> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::validation(format!("{collection}[{index}]: {e}")))
}

fn in_record<T>(collection: &str, index: usize, res: AppResult<T>) -> AppResult<T> {
    res.map_err(|e| match e {
        AppError::Validation(msg) => AppError::validation(format!("{collection}[{index}]: {msg}")),
        other => other,
    })
}

fn decode_pozzo(index: usize, raw: &Value) -> AppResult<PendingPozzo> {
    let obj = record("pozzi", index, raw)?;
    let old_id = old_id("pozzi", index, obj)?;
    let def: CreatePozzo = typed("pozzi", index, strip_audit(obj))?;

    in_record("pozzi", index, require_text("nome", &def.nome))?;
    in_record("pozzi", index, optional_non_negative("prezzoSocio", def.prezzo_socio))?;
    in_record(
        "pozzi",
        index,
        optional_non_negative("prezzoNonSocio", def.prezzo_non_socio),
    )?;
    Ok(PendingPozzo { old_id, def })
}

fn decode_cliente(index: usize, raw: &Value) -> AppResult<PendingCliente> {
    let obj = record("clienti", index, raw)?;
    let old_id = old_id("clienti", index, obj)?;
    let mut fields = strip_audit(obj);

    let old_pozzi_ids = match fields.remove("pozziIds") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                reference_id(item).ok_or_else(|| {
                    AppError::validation(format!("clienti[{index}]: pozziIds contiene un id non valido"))
                })
            })
            .collect::<AppResult<Vec<_>>>()?,
        Some(_) => {
            return Err(AppError::validation(format!(
                "clienti[{index}]: pozziIds deve essere un array"
            )))
        }
    };

    let def: CreateCliente = typed("clienti", index, fields)?;
    in_record("clienti", index, require_text("nome", &def.nome))?;
    in_record("clienti", index, require_text("cognome", &def.cognome))?;

    Ok(PendingCliente {
        old_id,
        old_pozzi_ids,
        def,
    })
}

fn decode_bolla(index: usize, raw: &Value) -> AppResult<PendingBolla> {
    let obj = record("bolle", index, raw)?;
    let mut fields = strip_audit(obj);

    let mut take_ref = |key: &str| {
        fields
            .remove(key)
            .as_ref()
            .and_then(reference_id)
            .ok_or_else(|| AppError::validation(format!("bolle[{index}]: {key} mancante")))
    };
    let old_cliente_id = take_ref("clienteId")?;
    let old_pozzo_id = take_ref("pozzoId")?;

    // rimpiazzati con i nuovi id durante l'import
    fields.insert("clienteId".into(), Value::String(old_cliente_id.clone()));
    fields.insert("pozzoId".into(), Value::String(old_pozzo_id.clone()));

    let def: CreateBolla = typed("bolle", index, fields)?;
    in_record("bolle", index, require_text("numeroBolla", &def.numero_bolla))?;
    in_record("bolle", index, require_non_negative("ore", def.ore))?;
    in_record("bolle", index, require_non_negative("metriCubi", def.metri_cubi))?;
    in_record("bolle", index, require_non_negative("acconto", def.acconto))?;
    in_record(
        "bolle",
        index,
        optional_non_negative("importoTotale", def.importo_totale),
    )?;

    Ok(PendingBolla {
        old_cliente_id,
        old_pozzo_id,
        def,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_id_accepts_strings_objects_and_oid() {
        assert_eq!(reference_id(&json!("abc")), Some("abc".to_string()));
        assert_eq!(
            reference_id(&json!({"_id": "abc", "nome": "Nord"})),
            Some("abc".to_string())
        );
        assert_eq!(
            reference_id(&json!({"$oid": "65a1b2c3d4e5f60718293a4b"})),
            Some("65a1b2c3d4e5f60718293a4b".to_string())
        );
        assert_eq!(
            reference_id(&json!({"_id": {"$oid": "65a1"}})),
            Some("65a1".to_string())
        );
        assert_eq!(reference_id(&json!(null)), None);
        assert_eq!(reference_id(&json!({"nome": "Nord"})), None);
    }

    #[test]
    fn missing_collections_are_rejected() {
        let err = DecodedSnapshot::from_value(&json!({"version": "1.0", "data": {}}));
        assert!(matches!(err, Err(AppError::Validation(_))));

        let err = DecodedSnapshot::from_value(&json!({"data": {"pozzi": [], "clienti": [], "bolle": []}}));
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn empty_collections_are_accepted() {
        let decoded = DecodedSnapshot::from_value(&json!({
            "version": "1.0",
            "data": {"pozzi": [], "clienti": [], "bolle": []}
        }))
        .unwrap();
        assert!(decoded.pozzi.is_empty() && decoded.clienti.is_empty() && decoded.bolle.is_empty());
    }

    #[test]
    fn audit_fields_are_stripped_and_refs_extracted() {
        let decoded = DecodedSnapshot::from_value(&json!({
            "version": "1.0",
            "data": {
                "pozzi": [{"_id": "p1", "__v": 0, "nome": "Nord", "createdAt": "2024-01-01T00:00:00.000Z"}],
                "clienti": [{"_id": "c1", "nome": "Mario", "cognome": "Rossi", "pozziIds": [{"$oid": "p1"}]}],
                "bolle": [{
                    "_id": "b1",
                    "numeroBolla": "12",
                    "data": "2024-05-10",
                    "clienteId": {"_id": "c1", "nome": "Mario"},
                    "pozzoId": "p1",
                    "ore": 1, "metriCubi": 15, "acconto": 0
                }]
            }
        }))
        .unwrap();

        assert_eq!(decoded.pozzi[0].old_id, "p1");
        assert!(decoded.pozzi[0].def.attivo);
        assert_eq!(decoded.clienti[0].old_pozzi_ids, vec!["p1".to_string()]);
        assert_eq!(decoded.bolle[0].old_cliente_id, "c1");
        assert_eq!(decoded.bolle[0].old_pozzo_id, "p1");
        assert_eq!(decoded.bolle[0].def.metri_cubi, 15.0);
    }

    #[test]
    fn bad_record_names_its_position() {
        let err = DecodedSnapshot::from_value(&json!({
            "version": "1.0",
            "data": {
                "pozzi": [{"_id": "p1", "nome": "Nord"}, {"_id": "p2", "nome": ""}],
                "clienti": [],
                "bolle": []
            }
        }));
        match err {
            Err(AppError::Validation(msg)) => assert!(msg.starts_with("pozzi[1]"), "{msg}"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
