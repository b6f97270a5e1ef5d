//! Integration-Tests fuer Bundle erfassen/anwenden (In-Memory SQLite)

use chrono::{Duration, Utc};

use klausur_core::{Benutzer, EventSlug, KlausurError, Pruefungsort, Rolle, VenueId};
use klausur_crypto::{fingerprint, CipherCodec, SubmissionCodec};
use klausur_db::{
    Anfrager, NeuePruefung, ParticipationRepository, PruefungsDienst, SqliteDb,
    SubmissionRepository,
};

const GEHEIMNIS: &str = "s3cr3t";

fn aufsicht() -> Anfrager {
    Anfrager::lokal("pengawas")
}

async fn dienst() -> PruefungsDienst<SqliteDb> {
    let db = SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden");
    PruefungsDienst::new(db, CipherCodec::default())
}

async fn ujian_fisika(dienst: &PruefungsDienst<SqliteDb>) -> EventSlug {
    let slug = EventSlug::from("ujian-fisika");
    let beginn = Utc::now() - Duration::minutes(30);
    dienst
        .pruefung_anlegen(
            NeuePruefung {
                slug: slug.clone(),
                title: "Ujian Fisika".into(),
                description: String::new(),
                starts_at: beginn,
                ends_at: beginn + Duration::hours(2),
            },
            &Pruefungsort {
                id: VenueId::new(),
                name: "Aula".into(),
            },
            GEHEIMNIS,
        )
        .await
        .unwrap();

    for (inhalt, auswahl) in [("Soal 1", ["A", "B"]), ("Soal 2", ["C", "D"])] {
        let auswahl: Vec<String> = auswahl.iter().map(|s| s.to_string()).collect();
        dienst
            .frage_verfassen(&slug, inhalt, &auswahl, GEHEIMNIS)
            .await
            .unwrap();
    }

    dienst
        .teilnahme_registrieren(
            &slug,
            &Benutzer {
                username: "budi".into(),
                name: "Budi".into(),
                role: Rolle::Participant,
                password_hash: "hash".into(),
            },
        )
        .await
        .unwrap();
    slug
}

#[tokio::test]
async fn erfassen_und_unveraendert_anwenden_ist_idempotent() {
    let dienst = dienst().await;
    let slug = ujian_fisika(&dienst).await;

    let bundle = dienst.synchronisation_erfassen(&slug, &aufsicht()).await.unwrap();
    assert_eq!(bundle.questions.len(), 2);
    assert_eq!(bundle.users.len(), 1);
    assert_eq!(bundle.participations.len(), 1);

    let zeitpunkt = dienst.synchronisation_anwenden(&bundle, &aufsicht()).await.unwrap();

    let fragen = dienst.fragen_abrufen(&slug, &aufsicht()).await.unwrap();
    assert_eq!(fragen, bundle.questions);

    let erneut = dienst.synchronisation_erfassen(&slug, &aufsicht()).await.unwrap();
    assert_eq!(erneut.questions, bundle.questions);
    assert_eq!(erneut.users, bundle.users);
    assert_eq!(erneut.participations, bundle.participations);
    assert_eq!(erneut.venue, bundle.venue);
    assert_eq!(erneut.event.last_synchronization, Some(zeitpunkt));
}

#[tokio::test]
async fn bundle_baut_pruefungsort_kopie_auf() {
    let zentrale = dienst().await;
    let slug = ujian_fisika(&zentrale).await;
    let bundle = zentrale.synchronisation_erfassen(&slug, &aufsicht()).await.unwrap();

    let ort = dienst().await;
    ort.synchronisation_anwenden(&bundle, &aufsicht()).await.unwrap();

    let kopie = ort.pruefung_laden(&slug).await.unwrap();
    assert_eq!(kopie.title, "Ujian Fisika");
    assert_eq!(kopie.key_check, bundle.event.key_check);
    assert!(kopie.last_synchronization.is_some());

    // Verifikation funktioniert offline gegen den mitgebrachten Pruefwert
    ort.fingerprint_verifizieren(&slug, "budi", &fingerprint(GEHEIMNIS))
        .await
        .unwrap();

    let fragen = ort
        .fragen_abrufen(&slug, &Anfrager::lokal("pengawas"))
        .await
        .unwrap();
    assert_eq!(fragen, bundle.questions);
}

#[tokio::test]
async fn anwenden_ersetzt_fragen_und_verwirft_antworten() {
    let dienst = dienst().await;
    let slug = ujian_fisika(&dienst).await;
    let wire = SubmissionCodec::default()
        .encode_submission("A", GEHEIMNIS)
        .unwrap();
    dienst
        .antwort_einreichen(&slug, &Anfrager::teilnehmer("budi"), 1, &wire)
        .await
        .unwrap();

    let mut bundle = dienst.synchronisation_erfassen(&slug, &aufsicht()).await.unwrap();
    bundle.questions.remove(0);
    bundle.event.title = "Ujian Fisika (revisi)".into();

    dienst.synchronisation_anwenden(&bundle, &aufsicht()).await.unwrap();

    let fragen = dienst
        .fragen_abrufen(&slug, &Anfrager::lokal("pengawas"))
        .await
        .unwrap();
    assert_eq!(fragen.len(), 1);
    // Neu durchnummeriert ab 1
    assert_eq!(fragen[0].number, 1);
    assert_eq!(fragen[0].content, bundle.questions[0].content);

    assert!(dienst
        .speicher()
        .antworten_laden(&slug, "budi")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        dienst.pruefung_laden(&slug).await.unwrap().title,
        "Ujian Fisika (revisi)"
    );
}

#[tokio::test]
async fn ungueltiges_bundle_laesst_speicher_unveraendert() {
    let dienst = dienst().await;
    let slug = ujian_fisika(&dienst).await;
    let vorher = dienst.synchronisation_erfassen(&slug, &aufsicht()).await.unwrap();

    let mut bundle = vorher.clone();
    bundle.event.title = String::new();
    bundle.questions.clear();
    bundle.participations.clear();

    let err = dienst.synchronisation_anwenden(&bundle, &aufsicht()).await.unwrap_err();
    assert!(matches!(err, KlausurError::BundleUngueltig(_)));

    let nachher = dienst.synchronisation_erfassen(&slug, &aufsicht()).await.unwrap();
    assert_eq!(nachher, vorher);
    assert_eq!(
        dienst.speicher().teilnahmen_laden(&slug).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn unbekannte_pruefung_erfassen() {
    let dienst = dienst().await;
    let err = dienst
        .synchronisation_erfassen(&EventSlug::from("ujian-kimia"), &aufsicht())
        .await
        .unwrap_err();
    assert!(matches!(err, KlausurError::PruefungNichtGefunden(_)));
}

#[tokio::test]
async fn teilnehmer_duerfen_nicht_synchronisieren() {
    let dienst = dienst().await;
    let slug = ujian_fisika(&dienst).await;
    let budi = Anfrager::teilnehmer("budi");
    let panitia = Anfrager::new("panitia", Rolle::Organizer);

    for anfrager in [&budi, &panitia] {
        let err = dienst
            .synchronisation_erfassen(&slug, anfrager)
            .await
            .unwrap_err();
        assert!(matches!(err, KlausurError::KeineBerechtigung(_)));
    }

    let vorher = dienst.synchronisation_erfassen(&slug, &aufsicht()).await.unwrap();
    let mut bundle = vorher.clone();
    bundle.questions.clear();
    bundle.event.title = "Ujian palsu".into();

    let err = dienst
        .synchronisation_anwenden(&bundle, &budi)
        .await
        .unwrap_err();
    assert!(matches!(err, KlausurError::KeineBerechtigung(_)));

    let nachher = dienst.synchronisation_erfassen(&slug, &aufsicht()).await.unwrap();
    assert_eq!(nachher, vorher);

    // Admin darf
    let admin = Anfrager::new("admin", Rolle::Admin);
    dienst.synchronisation_erfassen(&slug, &admin).await.unwrap();
}
