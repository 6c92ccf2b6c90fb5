//! Route handlers for the status surface.

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use qrcode::render::svg;
use qrcode::QrCode;
use serde::Serialize;

use intake_core::transport::ConnectionState;

use crate::state::AppState;

/// Response for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub connection: ConnectionState,
    pub active_sessions: usize,
}

/// GET /health - liveness plus channel connectivity.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        connection: state.transport.connection_state(),
        active_sessions: state.sessions.len().unwrap_or(0),
    })
}

/// GET / - self-refreshing status page; shows the login QR code while the
/// channel is pairing.
pub async fn status_page(State(state): State<AppState>) -> impl IntoResponse {
    let connection = state.transport.connection_state();
    let challenge = state.transport.login_challenge();
    let active = state.sessions.len().unwrap_or(0);
    Html(render_status(connection, challenge.as_deref(), active))
}

fn render_status(
    connection: ConnectionState,
    challenge: Option<&str>,
    active_sessions: usize,
) -> String {
    let body = match (connection, challenge) {
        (ConnectionState::QrPending, Some(data)) => match render_qr_svg(data) {
            Some(svg) => format!(
                "<p>Escaneie o código para conectar o canal:</p><div class=\"qr\">{}</div>",
                svg
            ),
            None => "<p>Aguardando código de pareamento...</p>".to_string(),
        },
        (ConnectionState::QrPending, None) => {
            "<p>Aguardando código de pareamento...</p>".to_string()
        }
        (ConnectionState::Ready, _) => format!(
            "<p class=\"ok\">✅ Canal conectado.</p><p>Atendimentos ativos: {}</p>",
            active_sessions
        ),
        (ConnectionState::Connecting, _) => "<p>Conectando ao canal...</p>".to_string(),
        (ConnectionState::Disconnected, _) => {
            "<p class=\"err\">❌ Canal desconectado.</p>".to_string()
        }
    };

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"pt-BR\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta http-equiv=\"refresh\" content=\"5\">\n\
         <title>Atendimento - status</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; max-width: 480px; margin: 40px auto; }}\n\
         .qr svg {{ width: 240px; height: 240px; }}\n\
         .ok {{ color: #1a7f37; }}\n\
         .err {{ color: #b91c1c; }}\n\
         </style>\n\
         </head>\n\
         <body>\n\
         <h1>Atendimento automático</h1>\n\
         <p>Estado do canal: <strong>{}</strong></p>\n\
         {}\n\
         </body>\n\
         </html>",
        connection, body
    )
}

fn render_qr_svg(data: &str) -> Option<String> {
    let code = QrCode::new(data.as_bytes()).ok()?;
    Some(
        code.render::<svg::Color>()
            .min_dimensions(240, 240)
            .build(),
    )
}
