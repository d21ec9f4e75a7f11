pub const USAGE: &str = "\
Uso: gestionale-pozzi <area> <comando> [argomenti]

  pozzi        list | get <id> | create <json> | update <id> <json> | delete <id>
  clienti      list | get <id> | create <json> | update <id> <json> | delete <id> | by-pozzo <pozzoId>
  bolle        list [--cliente <id>] [--pozzo <id>] [--detailed] | get <id> [--detailed]
               | create <json> | update <id> <json> | delete <id> | next-numero <pozzoId>
  appuntamenti list [--cliente <id>] [--pozzo <id>] [--stato <s>] [--dal <data>] [--al <data>]
               | get <id> | create <json> | update <id> <json> | delete <id> | stats
  backup       export [file] | import <file> | clear
  auth         init | generate [auto|manual|admin] | current | validate <email> <password>
               | stats | logs [n] | users
  help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Pozzi,
    Clienti,
    Bolle,
    Appuntamenti,
}

impl Area {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "pozzi" | "pozzo" => Some(Self::Pozzi),
            "clienti" | "cliente" => Some(Self::Clienti),
            "bolle" | "bolla" => Some(Self::Bolle),
            "appuntamenti" | "appuntamento" => Some(Self::Appuntamenti),
            _ => None,
        }
    }
}

/// Filtri opzionali per `list`. Stringhe grezze; ogni area valida quelli che accetta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub cliente: Option<String>,
    pub pozzo: Option<String>,
    pub stato: Option<String>,
    pub dal: Option<String>,
    pub al: Option<String>,
    pub detailed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    List { area: Area, filters: ListFilters },
    Get { area: Area, id: String, detailed: bool },
    Create { area: Area, json: String },
    Update { area: Area, id: String, json: String },
    Delete { area: Area, id: String },
    ClientiByPozzo { pozzo_id: String },
    BolleNextNumero { pozzo_id: String },
    AppuntamentiStats,
    BackupExport { file: Option<String> },
    BackupImport { file: String },
    BackupClear,
    AuthInit,
    AuthGenerate { generated_by: String },
    AuthCurrent,
    AuthValidate { email: String, password: String },
    AuthStats,
    AuthLogs { limit: u64 },
    AuthUsers,
    Help,
    Unknown(String),
}

impl AppCommand {
    /// Interpreta gli argomenti del processo (senza il nome del programma). Il JSON può arrivare in un solo argomento.
    pub fn from_args(args: &[String]) -> Self {
        let parts: Vec<&str> = args.iter().map(String::as_str).collect();
        Self::parse(&parts)
    }

    fn parse(parts: &[&str]) -> Self {
        let Some(&head) = parts.first() else {
            return AppCommand::Help;
        };

        if let Some(area) = Area::parse(head) {
            return parse_area(area, &parts[1..]);
        }

        match head {
            "backup" => match parts.get(1).copied() {
                Some("export") => AppCommand::BackupExport {
                    file: parts.get(2).map(|s| s.to_string()),
                },
                Some("import") => match parts.get(2) {
                    Some(file) => AppCommand::BackupImport {
                        file: file.to_string(),
                    },
                    None => AppCommand::Unknown("Uso: backup import <file>".to_string()),
                },
                Some("clear") => AppCommand::BackupClear,
                _ => AppCommand::Unknown("Uso: backup export [file] | import <file> | clear".to_string()),
            },
            "auth" => match parts.get(1).copied() {
                Some("init") => AppCommand::AuthInit,
                Some("generate") => AppCommand::AuthGenerate {
                    generated_by: parts.get(2).unwrap_or(&"manual").to_string(),
                },
                Some("current") => AppCommand::AuthCurrent,
                Some("validate") => match (parts.get(2), parts.get(3)) {
                    (Some(email), Some(password)) => AppCommand::AuthValidate {
                        email: email.to_string(),
                        password: password.to_string(),
                    },
                    _ => AppCommand::Unknown("Uso: auth validate <email> <password>".to_string()),
                },
                Some("stats") => AppCommand::AuthStats,
                Some("logs") => AppCommand::AuthLogs {
                    limit: parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(50),
                },
                Some("users") => AppCommand::AuthUsers,
                _ => AppCommand::Unknown(
                    "Uso: auth init | generate | current | validate | stats | logs [n] | users"
                        .to_string(),
                ),
            },
            "help" | "h" | "--help" | "-h" => AppCommand::Help,
            other => AppCommand::Unknown(format!("Comando sconosciuto: {}", other)),
        }
    }
}

fn parse_area(area: Area, parts: &[&str]) -> AppCommand {
    let verb = parts.first().copied();
    let id = parts.get(1).map(|s| s.to_string());

    match (verb, id) {
        (Some("list"), _) => match parse_filters(area, &parts[1..]) {
            Ok(filters) => AppCommand::List { area, filters },
            Err(msg) => AppCommand::Unknown(msg),
        },
        (Some("get"), Some(id)) => AppCommand::Get {
            area,
            id,
            detailed: parts[2..].contains(&"--detailed"),
        },
        (Some("create"), Some(_)) => AppCommand::Create {
            area,
            json: parts[1..].join(" "),
        },
        (Some("update"), Some(id)) if parts.len() > 2 => AppCommand::Update {
            area,
            id,
            json: parts[2..].join(" "),
        },
        (Some("delete"), Some(id)) => AppCommand::Delete { area, id },
        (Some("by-pozzo"), Some(pozzo_id)) if area == Area::Clienti => {
            AppCommand::ClientiByPozzo { pozzo_id }
        }
        (Some("next-numero"), Some(pozzo_id)) if area == Area::Bolle => {
            AppCommand::BolleNextNumero { pozzo_id }
        }
        (Some("stats"), _) if area == Area::Appuntamenti => AppCommand::AppuntamentiStats,
        (Some(v), _) => AppCommand::Unknown(format!("Comando {:?} non valido per {:?}\n\n{}", v, area, USAGE)),
        (None, _) => AppCommand::Unknown(USAGE.to_string()),
    }
}

fn parse_filters(area: Area, parts: &[&str]) -> Result<ListFilters, String> {
    let mut filters = ListFilters::default();
    let mut iter = parts.iter();
    while let Some(&flag) = iter.next() {
        if flag == "--detailed" && area == Area::Bolle {
            filters.detailed = true;
            continue;
        }
        let slot = match (area, flag) {
            (Area::Bolle | Area::Appuntamenti, "--cliente") => &mut filters.cliente,
            (Area::Bolle | Area::Appuntamenti, "--pozzo") => &mut filters.pozzo,
            (Area::Appuntamenti, "--stato") => &mut filters.stato,
            (Area::Appuntamenti, "--dal") => &mut filters.dal,
            (Area::Appuntamenti, "--al") => &mut filters.al,
            _ => return Err(format!("Filtro non supportato: {}", flag)),
        };
        match iter.next() {
            Some(value) => *slot = Some(value.to_string()),
            None => return Err(format!("Valore mancante per {}", flag)),
        }
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn cmd(line: &str) -> AppCommand {
        let words: Vec<String> = line.split_whitespace().map(String::from).collect();
        AppCommand::from_args(&words)
    }

    #[test]
    fn parses_crud_verbs() {
        assert_eq!(
            cmd("pozzi list"),
            AppCommand::List {
                area: Area::Pozzi,
                filters: ListFilters::default()
            }
        );
        assert_eq!(
            cmd("clienti delete abc"),
            AppCommand::Delete {
                area: Area::Clienti,
                id: "abc".to_string()
            }
        );
        assert_eq!(
            cmd("bolle next-numero p1"),
            AppCommand::BolleNextNumero {
                pozzo_id: "p1".to_string()
            }
        );
    }

    #[test]
    fn json_payload_survives_as_single_argument_or_split_words() {
        let from_args = AppCommand::from_args(&args(&["pozzi", "update", "p1", r#"{"nome": "Pozzo Nord"}"#]));
        assert_eq!(
            from_args,
            AppCommand::Update {
                area: Area::Pozzi,
                id: "p1".to_string(),
                json: r#"{"nome": "Pozzo Nord"}"#.to_string()
            }
        );
        let split = cmd(r#"pozzi update p1 {"nome": "Pozzo Nord"}"#);
        assert_eq!(split, from_args);
    }

    #[test]
    fn list_filters_per_area() {
        match cmd("appuntamenti list --stato Programmato --dal 2024-05-01") {
            AppCommand::List { filters, .. } => {
                assert_eq!(filters.stato.as_deref(), Some("Programmato"));
                assert_eq!(filters.dal.as_deref(), Some("2024-05-01"));
                assert!(filters.al.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            cmd("pozzi list --cliente c1"),
            AppCommand::Unknown(_)
        ));
        assert!(matches!(
            cmd("bolle list --pozzo"),
            AppCommand::Unknown(_)
        ));
    }

    #[test]
    fn backup_and_auth_commands() {
        assert_eq!(
            AppCommand::from_args(&args(&["backup", "export"])),
            AppCommand::BackupExport { file: None }
        );
        assert!(matches!(
            AppCommand::from_args(&args(&["backup", "import"])),
            AppCommand::Unknown(_)
        ));
        assert_eq!(
            cmd("auth logs 5"),
            AppCommand::AuthLogs { limit: 5 }
        );
        assert_eq!(
            cmd("auth generate"),
            AppCommand::AuthGenerate {
                generated_by: "manual".to_string()
            }
        );
        assert_eq!(AppCommand::from_args(&[]), AppCommand::Help);
    }
}
