use std::process::ExitCode;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use actividades::api::HttpApiClient;
use actividades::cli::{self, Command, USAGE};
use actividades::config::ApiConfig;
use actividades::pages::{self, AppContext, Outcome};
use actividades::render;
use actividades::session::{SessionHandle, SqliteSessionStore};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "actividades=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match cli::parse(&args) {
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return Ok(ExitCode::SUCCESS);
        }
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return Ok(ExitCode::from(2));
        }
    };

    let config = ApiConfig::new_from_env()?;
    info!("using API at {}", config.base_url);

    let store = SqliteSessionStore::connect(&config.session_database_url).await?;
    let session = SessionHandle::new(Arc::new(store));
    let api = HttpApiClient::new(config, session.clone())?;
    let ctx = AppContext::new(Arc::new(api), session);

    let outcome = dispatch(&ctx, command).await;
    Ok(report(outcome))
}

async fn dispatch(ctx: &AppContext, command: Command) -> Outcome {
    match command {
        Command::Login(form) => pages::auth::login(ctx, form).await,
        Command::Register(form) => pages::auth::register(ctx, form).await,
        Command::Logout => pages::auth::logout(ctx).await,
        Command::Today => pages::today::show(ctx).await,
        Command::List => pages::activities::list(ctx).await,
        Command::Show(id) => pages::detail::show(ctx, id).await,
        Command::Create { activity, subtasks } => pages::create::create(ctx, activity, subtasks).await,
        Command::Edit { id, edits } => pages::edit::edit(ctx, id, edits).await,
        Command::Delete { id, confirmed } => pages::edit::delete(ctx, id, confirmed).await,
        Command::AddSubtask { activity_id, form } => pages::subtasks::add(ctx, activity_id, form).await,
        Command::ToggleSubtask {
            activity_id,
            subtask_id,
        } => pages::subtasks::toggle(ctx, activity_id, subtask_id).await,
        Command::SetSubtaskStatus {
            activity_id,
            subtask_id,
            status,
        } => pages::subtasks::set_status(ctx, activity_id, subtask_id, status).await,
        Command::DeleteSubtask {
            activity_id,
            subtask_id,
            confirmed,
        } => pages::subtasks::remove(ctx, activity_id, subtask_id, confirmed).await,
        Command::Help => Outcome::Render(USAGE.to_string()),
    }
}

fn report(outcome: Outcome) -> ExitCode {
    match outcome {
        Outcome::Render(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Outcome::Failed(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
        Outcome::Redirect { to, notice } => {
            // An error notice on a redirect means the session was missing
            // or rejected.
            let failed = notice.as_deref().is_some_and(render::is_error_alert);
            if let Some(notice) = notice {
                println!("{}", notice);
            }
            println!("→ {}", to);
            if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
        }
    }
}
