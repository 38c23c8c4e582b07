//! Background task reacting to debounced terms.
//!
//! Holds only a weak reference so a session is dropped once its last handle
//! goes away; the task then exits on its own.

use std::sync::Weak;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{SearchSession, Shared};

pub(super) fn spawn<T>(
    shared: Weak<Shared<T>>,
    mut term_rx: watch::Receiver<String>,
    mut suggestion_rx: watch::Receiver<String>,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = term_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let term = term_rx.borrow_and_update().clone();
                    let Some(session) = upgrade(&shared) else { break };
                    on_term(session, term);
                }
                changed = suggestion_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let term = suggestion_rx.borrow_and_update().clone();
                    let Some(session) = upgrade(&shared) else { break };
                    on_suggestion_term(session, term);
                }
            }
        }
        debug!("Session driver stopped");
    })
}

fn upgrade<T>(shared: &Weak<Shared<T>>) -> Option<SearchSession<T>> {
    shared.upgrade().map(|shared| SearchSession { shared })
}

fn on_term<T>(session: SearchSession<T>, term: String)
where
    T: Clone + Send + Sync + 'static,
{
    trace!(term = %term, "Debounced term settled");
    session.publish();
    if session.config().auto_search && !term.trim().is_empty() {
        tokio::spawn(async move {
            session.search(None).await;
        });
    }
}

fn on_suggestion_term<T>(session: SearchSession<T>, term: String)
where
    T: Clone + Send + Sync + 'static,
{
    if !session.config().enable_suggestions {
        return;
    }
    tokio::spawn(async move {
        session.fetch_suggestions(&term).await;
    });
}
