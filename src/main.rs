use foodgram::{
    app::{build_app, init_tracing, serve},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("foodgram=debug,axum=info,tower_http=info");

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    serve(build_app(app_state)).await
}
