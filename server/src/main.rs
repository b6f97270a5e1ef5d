//! Klausur Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und fuehrt einen
//! Betriebsbefehl aus.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use klausur_core::{Darstellung, EventSlug};
use klausur_crypto::fingerprint;
use klausur_server::{config::KlausurConfig, Anwendung};

#[derive(Parser)]
#[command(name = "klausur-server")]
#[command(about = "Betriebswerkzeug fuer verschluesselte Pruefungen und Offline-Synchronisation", long_about = None)]
#[command(version)]
struct Cli {
    /// Pfad zur TOML-Konfiguration
    #[arg(long, env = "KLAUSUR_CONFIG", default_value = "klausur.toml")]
    config: PathBuf,

    #[command(subcommand)]
    befehl: Befehl,
}

#[derive(Subcommand)]
enum Befehl {
    /// Gibt den Fingerprint (sha256 hex) eines Geheimnisses aus
    Fingerprint {
        geheimnis: String,
    },

    /// Listet alle Pruefungen
    Pruefungen,

    /// Zeigt die Fragen einer Pruefung in gespeicherter Darstellung
    Fragen {
        slug: String,
    },

    /// Schreibt das Synchronisations-Bundle einer Pruefung als JSON-Datei
    Export {
        slug: String,
        /// Zieldatei (Standard: <export_verzeichnis>/<slug>.json)
        #[arg(short, long)]
        ausgabe: Option<PathBuf>,
    },

    /// Wendet ein Bundle aus einer JSON-Datei an
    Import {
        datei: PathBuf,
    },

    /// Entschluesselt eine Pruefung dauerhaft im Speicher
    Entschluesseln {
        slug: String,
        #[arg(long)]
        schluessel: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Kein Speicher noetig
    if let Befehl::Fingerprint { geheimnis } = &cli.befehl {
        println!("{}", fingerprint(geheimnis));
        return Ok(());
    }

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = KlausurConfig::laden(&cli.config)?;

    let logging = config.logging.clone().aus_umgebung()?;
    klausur_observability::logging_initialisieren(&logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "Klausur wird initialisiert"
    );

    let app = Anwendung::oeffnen(config).await?;
    let ergebnis = ausfuehren(&app, cli.befehl).await;
    app.schliessen().await;
    ergebnis
}

async fn ausfuehren(app: &Anwendung, befehl: Befehl) -> Result<()> {
    match befehl {
        Befehl::Fingerprint { geheimnis } => {
            println!("{}", fingerprint(&geheimnis));
        }
        Befehl::Pruefungen => {
            for p in app.pruefungen().await? {
                let status = if p.is_decrypted {
                    "entschluesselt"
                } else {
                    "verschluesselt"
                };
                println!("{}\t{}\t{}\t{}", p.slug, p.starts_at.to_rfc3339(), status, p.title);
            }
        }
        Befehl::Fragen { slug } => {
            for frage in app.fragen(&EventSlug::new(slug)).await? {
                match frage.representation {
                    Darstellung::Decrypted => {
                        println!("{}. {}", frage.number, frage.content);
                        for (i, auswahl) in frage.choices.iter().enumerate() {
                            println!("   {}) {}", i + 1, auswahl);
                        }
                    }
                    Darstellung::Encrypted => {
                        println!("{}. [verschluesselt] {}", frage.number, frage.content);
                    }
                }
            }
        }
        Befehl::Export { slug, ausgabe } => {
            let pfad = app
                .exportieren(&EventSlug::new(slug), ausgabe.as_deref())
                .await?;
            println!("{}", pfad.display());
        }
        Befehl::Import { datei } => {
            let ack = app.importieren(&datei).await?;
            println!(
                "{} angewendet am {}",
                ack.slug,
                ack.angewendet_am.to_rfc3339()
            );
        }
        Befehl::Entschluesseln { slug, schluessel } => {
            let slug = EventSlug::new(slug);
            if app.entschluesseln(&slug, &schluessel).await? {
                println!("{slug} dauerhaft entschluesselt");
            } else {
                println!("{slug} war bereits entschluesselt");
            }
        }
    }
    Ok(())
}
