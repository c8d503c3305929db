//! Progress of an existing treatment session.

use crate::api::{SessionStatus, TreatmentSession, TreatmentSessionApi, TreatmentSessionUpdate};
use crate::error::ClinicError;
use tracing::info;

/// Count one more completed session.
///
/// Refuses to go past `planned_sessions` or to touch a closed session, so
/// `0 <= completed_sessions <= planned_sessions` always holds.
pub async fn record_session_completion<A>(
    api: &A,
    session: &TreatmentSession,
) -> Result<TreatmentSession, ClinicError>
where
    A: TreatmentSessionApi + ?Sized,
{
    if session.is_closed() {
        return Err(ClinicError::Validation {
            message: format!(
                "Sessão {} já encerrada ({}/{})",
                session.id, session.completed_sessions, session.planned_sessions
            ),
        });
    }
    let completed_sessions = session.completed_sessions + 1;
    let updated = api
        .update_treatment_session(session.id, TreatmentSessionUpdate { completed_sessions })
        .await
        .map_err(|e| ClinicError::Backend(e.message))?;
    info!(
        session_id = updated.id,
        completed = updated.completed_sessions,
        planned = updated.planned_sessions,
        "Treatment session progressed"
    );
    Ok(updated)
}

/// Cancel a session that is still open.
pub async fn cancel_treatment_session<A>(
    api: &A,
    session: &TreatmentSession,
) -> Result<TreatmentSession, ClinicError>
where
    A: TreatmentSessionApi + ?Sized,
{
    if session.status == SessionStatus::Cancelled {
        return Err(ClinicError::Validation {
            message: format!("Sessão {} já cancelada", session.id),
        });
    }
    api.delete_treatment_session(session.id)
        .await
        .map_err(|e| ClinicError::Backend(e.message))?;
    info!(session_id = session.id, "Treatment session cancelled");
    Ok(TreatmentSession {
        status: SessionStatus::Cancelled,
        ..session.clone()
    })
}
