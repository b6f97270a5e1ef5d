//! Event-Bus auf Basis von `tokio::sync::broadcast`
//!
//! Jeder Abonnent erhaelt alle Ereignisse ab dem Zeitpunkt des Abonnements.
//! Faellt ein Abonnent zu weit zurueck, werden die aeltesten Ereignisse
//! uebersprungen und ein Warnhinweis geloggt.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use klausur_core::{EventBus, EventEmpfaenger, KlausurEvent};

/// Standard-Kapazitaet des Broadcast-Kanals
pub const STANDARD_KAPAZITAET: usize = 64;

#[derive(Debug, Clone)]
pub struct BroadcastBus {
    sender: broadcast::Sender<KlausurEvent>,
}

impl BroadcastBus {
    pub fn new(kapazitaet: usize) -> Self {
        let (sender, _) = broadcast::channel(kapazitaet.max(1));
        Self { sender }
    }

    /// Roher Empfaenger fuer asynchrone Konsumenten
    pub fn empfaenger(&self) -> broadcast::Receiver<KlausurEvent> {
        self.sender.subscribe()
    }

    pub fn anzahl_abonnenten(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(STANDARD_KAPAZITAET)
    }
}

impl EventBus for BroadcastBus {
    fn senden(&self, event: KlausurEvent) -> klausur_core::Result<()> {
        // Ohne Abonnenten geht das Ereignis verloren; das ist kein Fehler
        if self.sender.send(event).is_err() {
            tracing::trace!("Ereignis ohne Abonnenten verworfen");
        }
        Ok(())
    }

    fn abonnieren(&self) -> Box<dyn EventEmpfaenger + Send> {
        Box::new(BroadcastEmpfaenger {
            empfaenger: self.sender.subscribe(),
        })
    }
}

struct BroadcastEmpfaenger {
    empfaenger: broadcast::Receiver<KlausurEvent>,
}

impl EventEmpfaenger for BroadcastEmpfaenger {
    fn empfangen(&mut self) -> Option<KlausurEvent> {
        loop {
            match self.empfaenger.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(verpasst)) => {
                    tracing::warn!(verpasst, "Event-Abonnent zu langsam, Ereignisse uebersprungen");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klausur_core::EventSlug;

    #[test]
    fn abonnent_empfaengt_ereignisse() {
        let bus = BroadcastBus::default();
        let mut empfaenger = bus.abonnieren();

        bus.senden(KlausurEvent::SitzungBeendet).unwrap();
        bus.senden(KlausurEvent::PruefungEntschluesselt {
            slug: EventSlug::from("ujian-fisika"),
        })
        .unwrap();

        assert_eq!(empfaenger.empfangen(), Some(KlausurEvent::SitzungBeendet));
        assert!(matches!(
            empfaenger.empfangen(),
            Some(KlausurEvent::PruefungEntschluesselt { .. })
        ));
        assert_eq!(empfaenger.empfangen(), None);
    }

    #[test]
    fn senden_ohne_abonnenten_ist_ok() {
        let bus = BroadcastBus::default();
        assert_eq!(bus.anzahl_abonnenten(), 0);
        assert!(bus.senden(KlausurEvent::SitzungBeendet).is_ok());
    }

    #[test]
    fn langsamer_abonnent_verliert_aelteste() {
        let bus = BroadcastBus::new(2);
        let mut empfaenger = bus.abonnieren();
        for i in 0..4 {
            bus.senden(KlausurEvent::GeheimnisHinterlegt {
                slug: EventSlug::new(format!("ujian-{i}")),
            })
            .unwrap();
        }
        assert_eq!(
            empfaenger.empfangen(),
            Some(KlausurEvent::GeheimnisHinterlegt {
                slug: EventSlug::from("ujian-2")
            })
        );
    }

    #[tokio::test]
    async fn asynchroner_empfaenger() {
        let bus = BroadcastBus::default();
        let mut rx = bus.empfaenger();
        bus.senden(KlausurEvent::SitzungBeendet).unwrap();
        assert_eq!(rx.recv().await.unwrap(), KlausurEvent::SitzungBeendet);
    }
}
