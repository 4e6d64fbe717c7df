use actix_web::{
    body::BoxBody,
    error, get,
    http::{header::ContentType, StatusCode},
    post, web, App, HttpResponse, HttpServer,
};
use blackjack_lib::{DealerRule, HandShape};
use blackjack_sim::prelude::*;
use log::{error, info};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;

/// A struct for handling the configuration of the simulator. Meant to be deserialized from JSON.
#[derive(Debug, Deserialize)]
struct GameConfig {
    rounds: u32,
    bet: f64,
    num_simulations: Option<u32>,
    soft_seventeen: Option<bool>,
    seed: Option<u64>,
    strict_actions: Option<bool>,
}

impl From<GameConfig> for BlackjackSimulatorConfig {
    fn from(value: GameConfig) -> Self {
        let mut builder = BlackjackSimulatorConfig::new();
        builder
            .rounds(value.rounds)
            .bet(value.bet)
            .num_simulations(value.num_simulations.unwrap_or(1))
            .soft_seventeen(value.soft_seventeen.unwrap_or(false))
            .strict_actions(value.strict_actions.unwrap_or(false))
            .silent(true);
        if let Some(seed) = value.seed {
            builder.seed(seed);
        }
        builder.build()
    }
}

/// An enum that will handle user facing errors
#[derive(Debug)]
enum UserError {
    InternalError,
    SimulationCreationError(String),
    SimulatorNotCreated,
    BadInput(String),
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserError::InternalError => write!(f, "an internal error occured"),
            UserError::SimulationCreationError(s) => write!(f, "{}", s),
            UserError::SimulatorNotCreated => write!(
                f,
                "unable to run, a simulator has not been configured"
            ),
            UserError::BadInput(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for UserError {}

impl error::ResponseError for UserError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::html())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            UserError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            UserError::SimulationCreationError(_) => StatusCode::BAD_REQUEST,
            UserError::SimulatorNotCreated => StatusCode::BAD_REQUEST,
            UserError::BadInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<SimulationError> for UserError {
    fn from(e: SimulationError) -> Self {
        match e {
            SimulationError::Config(s) => UserError::SimulationCreationError(s),
            SimulationError::Game(e) if e.is_configuration_error() => {
                UserError::BadInput(e.to_string())
            }
            e => {
                error!("simulation failed: {}", e);
                UserError::InternalError
            }
        }
    }
}

fn parse_rule(rule: &str) -> Result<DealerRule, UserError> {
    match rule.to_ascii_lowercase().as_str() {
        "s17" => Ok(DealerRule::StandSoft17),
        "h17" => Ok(DealerRule::HitSoft17),
        _ => Err(UserError::BadInput(format!(
            "unknown dealer rule `{}`, expected s17 or h17",
            rule
        ))),
    }
}

/// A handler that will configure, and build a new `BlackjackSimulator` using the parameters in the body of the request
#[post("/config-sim")]
async fn configure_simulation(
    params: web::Json<GameConfig>,
    app_sim: web::Data<Mutex<Option<BlackjackSimulator>>>,
) -> Result<HttpResponse, UserError> {
    let config = BlackjackSimulatorConfig::from(params.into_inner());
    let simulator = BlackjackSimulator::new(config)?;
    let Ok(mut guard) = app_sim.lock() else {
        return Err(UserError::InternalError);
    };

    info!("configured simulator: {:?}", config);
    *guard = Some(simulator);
    Ok(HttpResponse::Ok().body("simulator created successfully"))
}

/// A handler that will run the configured simulations and return their summaries as JSON.
/// Will return an error response if the simulator has not been configured.
#[get("/run-sim")]
async fn run_simulation(
    app_sim: web::Data<Mutex<Option<BlackjackSimulator>>>,
) -> Result<HttpResponse, UserError> {
    let Ok(guard) = app_sim.lock() else {
        return Err(UserError::InternalError);
    };
    let Some(simulator) = guard.as_ref() else {
        return Err(UserError::SimulatorNotCreated);
    };

    let rule = simulator.config.rule();
    let summaries: Vec<SimulationSummary> = simulator
        .run(Box::new(io::sink()))?
        .iter()
        .enumerate()
        .map(|(i, stats)| SimulationSummary::new(format!("simulation #{}", i + 1), rule, stats))
        .collect();

    match serde_json::to_string(&summaries) {
        Ok(body) => Ok(HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(body)),
        Err(_) => Err(UserError::InternalError),
    }
}

/// A handler returning the built-in strategy tables for a dealer rule, keyed by player total then dealer upcard.
#[get("/strategy/{rule}")]
async fn get_strategy(path: web::Path<String>) -> Result<HttpResponse, UserError> {
    let rule = parse_rule(&path.into_inner())?;
    let strategy = BasicStrategy::builtin(rule);
    let tables: BTreeMap<&str, _> = [
        ("hard", strategy.table(HandShape::Hard).to_nested_map()),
        ("soft", strategy.table(HandShape::Soft).to_nested_map()),
    ]
    .into_iter()
    .collect();

    match serde_json::to_string(&tables) {
        Ok(body) => Ok(HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(body)),
        Err(_) => Err(UserError::InternalError),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let address = "127.0.0.1";
    let port = 8080;
    info!("listening at {}:{}...", address, port);

    let app_sim: web::Data<Mutex<Option<BlackjackSimulator>>> = web::Data::new(Mutex::new(None));

    HttpServer::new(move || {
        App::new()
            .app_data(app_sim.clone())
            .service(configure_simulation)
            .service(run_simulation)
            .service(get_strategy)
    })
    .bind((address, port))?
    .run()
    .await
}
