pub mod appuntamenti;
pub mod bolle;
pub mod clienti;
pub mod pozzi;
pub mod validation;

pub use appuntamenti::AppuntamentiService;
pub use bolle::BolleService;
pub use clienti::ClientiService;
pub use pozzi::PozziService;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::storage::repository::{CreateBolla, CreateCliente, CreatePozzo};
    use chrono::{TimeZone, Utc};

    pub fn pozzo(nome: &str) -> CreatePozzo {
        CreatePozzo {
            nome: nome.to_string(),
            ubicazione: Some("Contrada Lama".to_string()),
            attivo: true,
            note: None,
            prezzo_socio: Some(1.5),
            prezzo_non_socio: Some(2.0),
        }
    }

    pub fn cliente(nome: &str, cognome: &str, pozzi_ids: Vec<String>) -> CreateCliente {
        CreateCliente {
            nome: nome.to_string(),
            cognome: cognome.to_string(),
            codice_fiscale: None,
            telefono: Some("0831 123456".to_string()),
            email: None,
            indirizzo: None,
            pozzi_ids,
            attivo: true,
            socio: true,
            note: None,
        }
    }

    pub fn bolla(numero: &str, cliente_id: &str, pozzo_id: &str) -> CreateBolla {
        CreateBolla {
            numero_bolla: numero.to_string(),
            data: Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap(),
            cliente_id: cliente_id.to_string(),
            pozzo_id: pozzo_id.to_string(),
            ore: 2.0,
            metri_cubi: 30.0,
            acconto: 0.0,
            saldato: false,
            cliente_socio: true,
            importo_totale: Some(45.0),
            note: None,
        }
    }
}
