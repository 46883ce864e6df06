use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storedesk::api::types::{
  BookingStatus, Credentials, OrderStatus, ProductForm, WithdrawalRequest,
};
use storedesk::api::{ApiError, ListParams};
use storedesk::cache::Query;
use storedesk::config::Config;
use storedesk::hooks;
use storedesk::notify::{notify_error, Level, Navigator, Notifier};
use storedesk::session::{Session, SqliteStorage};
use storedesk::AdminContext;

const LOG_ENV: &str = "STOREDESK_LOG";
const DEFAULT_LOG_FILTER: &str = "storedesk=info";

#[derive(Parser, Debug)]
#[command(name = "storedesk")]
#[command(about = "Merchant admin for the storedesk commerce backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/storedesk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in and keep the session
  Login {
    email: String,
    #[arg(long)]
    password: String,
  },
  /// Forget the session
  Logout,
  /// Show the signed-in merchant's profile
  Whoami,
  /// Start a password reset
  ForgotPassword { email: String },
  /// Finish a password reset with the emailed token already stored
  ResetPassword {
    #[arg(long)]
    password: String,
  },
  #[command(subcommand)]
  Products(ProductsCommand),
  #[command(subcommand)]
  Bookings(BookingsCommand),
  #[command(subcommand)]
  Orders(OrdersCommand),
  /// List active offers
  Offers(PageArgs),
  #[command(subcommand)]
  Withdrawals(WithdrawalsCommand),
  /// Show wallet balance
  Balance,
  /// List wallet transactions
  Transactions(PageArgs),
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct PageArgs {
  #[arg(long, default_value_t = 1)]
  page: u32,
  #[arg(long, default_value_t = 20)]
  limit: u32,
}

impl PageArgs {
  fn params(self) -> ListParams {
    ListParams::page(self.page, self.limit)
  }
}

#[derive(Subcommand, Debug)]
enum ProductsCommand {
  List(PageArgs),
  Create {
    name: String,
    #[arg(long)]
    price: f64,
    #[arg(long)]
    stock: Option<i64>,
  },
  Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum BookingsCommand {
  List {
    #[command(flatten)]
    page: PageArgs,
    #[arg(long)]
    status: Option<String>,
  },
  Confirm { id: String },
  Cancel { id: String },
}

#[derive(Subcommand, Debug)]
enum OrdersCommand {
  List(PageArgs),
  Ready { id: String },
}

#[derive(Subcommand, Debug)]
enum WithdrawalsCommand {
  List(PageArgs),
  Request { amount: f64 },
}

/// Prints notifications for the terminal and mirrors them to the log.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
  fn notify(&self, level: Level, message: &str) {
    match level {
      Level::Success => {
        info!(toast = message, "success");
        eprintln!("ok: {}", message);
      }
      Level::Error => {
        warn!(toast = message, "error");
        eprintln!("error: {}", message);
      }
    }
  }
}

/// Routes have no meaning on a terminal; record them for debugging.
struct LogNavigator;

impl Navigator for LogNavigator {
  fn navigate(&self, route: &str) {
    debug!(route, "navigate");
  }
}

fn data_dir() -> Result<PathBuf> {
  let dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;
  Ok(dir.join("storedesk"))
}

fn init_logging(dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir)?;
  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
    dir,
    "storedesk.log",
  ));

  let filter =
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .init();

  Ok(guard)
}

/// Fetch a query to completion, announcing a failure the same way a
/// mutation would.
async fn load<T>(ctx: &AdminContext, mut query: Query<T>, fallback: &str) -> Result<T, ApiError>
where
  T: Clone + Send + Sync + 'static,
{
  query.fetch();
  query.settle().await;

  if let Some(error) = query.error() {
    notify_error(ctx.notifier.as_ref(), error, fallback);
    return Err(error.clone());
  }
  query.data().cloned().ok_or(ApiError::Cancelled)
}

fn needs_session(command: &Command) -> bool {
  !matches!(
    command,
    Command::Login { .. }
      | Command::Logout
      | Command::ForgotPassword { .. }
      | Command::ResetPassword { .. }
  )
}

async fn run(ctx: &AdminContext, command: Command) -> Result<(), ApiError> {
  match command {
    Command::Login { email, password } => {
      let response = hooks::auth::login(ctx)
        .mutate(Credentials { email, password })
        .await?;
      println!("Signed in as {}", response.user.name);
    }
    Command::Logout => {
      hooks::auth::logout(ctx).map_err(|e| ApiError::Session(e.to_string()))?;
      println!("Signed out");
    }
    Command::Whoami => {
      let profile = load(ctx, hooks::auth::profile(ctx), "Could not load profile").await?;
      println!("{} <{}>", profile.name, profile.email);
      if let Some(shop) = profile.shop_name {
        println!("shop: {}", shop);
      }
    }
    Command::ForgotPassword { email } => {
      hooks::auth::forgot_password(ctx).mutate(email).await?;
    }
    Command::ResetPassword { password } => {
      hooks::auth::reset_password(ctx).mutate(password).await?;
    }
    Command::Products(ProductsCommand::List(page)) => {
      let query = hooks::products::my_shop_products(ctx, page.params());
      let products = load(ctx, query, "Could not load products").await?;
      for product in &products.items {
        println!("{:<26} {:>10.2}  {}", product.id, product.price, product.name);
      }
      println!("page {} ({} total)", page.page, products.total);
    }
    Command::Products(ProductsCommand::Create { name, price, stock }) => {
      let product = hooks::products::create_product(ctx)
        .mutate(ProductForm {
          name,
          price,
          stock,
          ..ProductForm::default()
        })
        .await?;
      println!("{}", product.id);
    }
    Command::Products(ProductsCommand::Delete { id }) => {
      hooks::products::delete_product(ctx).mutate(id).await?;
    }
    Command::Bookings(BookingsCommand::List { page, status }) => {
      let mut params = page.params();
      if let Some(status) = status {
        params = params.with("status", status);
      }
      let bookings = load(ctx, hooks::bookings::bookings(ctx, params), "Could not load bookings").await?;
      for booking in &bookings.items {
        println!(
          "{:<26} {:<10} {}",
          booking.id,
          booking.status,
          booking.customer_name.as_deref().unwrap_or("-")
        );
      }
    }
    Command::Bookings(BookingsCommand::Confirm { id }) => {
      hooks::bookings::update_booking_status(ctx)
        .mutate((id, BookingStatus::Confirmed))
        .await?;
    }
    Command::Bookings(BookingsCommand::Cancel { id }) => {
      hooks::bookings::update_booking_status(ctx)
        .mutate((id, BookingStatus::Cancelled))
        .await?;
    }
    Command::Orders(OrdersCommand::List(page)) => {
      let orders = load(ctx, hooks::food_mart::orders(ctx, page.params()), "Could not load orders").await?;
      for order in &orders.items {
        println!("{:<26} {:<10} {:>10.2}", order.id, order.status, order.total);
      }
    }
    Command::Orders(OrdersCommand::Ready { id }) => {
      hooks::food_mart::update_order_status(ctx)
        .mutate((id, OrderStatus::Ready))
        .await?;
    }
    Command::Offers(page) => {
      let offers = load(ctx, hooks::offers::offers(ctx, page.params()), "Could not load offers").await?;
      for offer in &offers.items {
        println!("{:<26} {:>5.1}%  {}", offer.id, offer.discount_percent, offer.title);
      }
    }
    Command::Withdrawals(WithdrawalsCommand::List(page)) => {
      let query = hooks::withdrawals::withdrawals(ctx, page.params());
      let withdrawals = load(ctx, query, "Could not load withdrawals").await?;
      for withdrawal in &withdrawals.items {
        println!(
          "{:<26} {:>10.2}  {}",
          withdrawal.id, withdrawal.amount, withdrawal.status
        );
      }
    }
    Command::Withdrawals(WithdrawalsCommand::Request { amount }) => {
      hooks::withdrawals::request_withdrawal(ctx)
        .mutate(WithdrawalRequest {
          amount,
          bank_account_id: None,
        })
        .await?;
    }
    Command::Balance => {
      let balance = load(ctx, hooks::withdrawals::wallet_balance(ctx), "Could not load balance").await?;
      let currency = balance.currency.as_deref().unwrap_or("");
      println!("available: {:.2} {}", balance.available, currency);
      println!("pending:   {:.2} {}", balance.pending, currency);
    }
    Command::Transactions(page) => {
      let query = hooks::transactions::transactions(ctx, page.params());
      let transactions = load(ctx, query, "Could not load transactions").await?;
      for transaction in &transactions.items {
        println!(
          "{:<26} {:<10} {:>10.2}",
          transaction.id, transaction.kind, transaction.amount
        );
      }
    }
  }
  Ok(())
}

/// Exit status for a finished command. Failures other than a rejected
/// session were already announced by the notifier.
fn finish(ctx: &AdminContext, result: Result<(), ApiError>) -> Result<u8> {
  match result {
    Ok(()) => Ok(0),
    Err(err) if err.is_unauthorized() => {
      warn!("session rejected by server");
      ctx.logout()?;
      Err(eyre!("Session expired. Please sign in again"))
    }
    Err(err) => {
      error!(%err, "command failed");
      Ok(1)
    }
  }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();

  let _guard = init_logging(&data_dir()?)?;

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  info!(base_url = %config.api.base_url, "starting");

  let storage = match &config.session.path {
    Some(path) => SqliteStorage::open(path)?,
    None => SqliteStorage::open_default()?,
  };
  let session = Session::new(storage);

  let ctx = AdminContext::new(
    &config,
    session,
    Arc::new(TerminalNotifier),
    Arc::new(LogNavigator),
  )?;

  if needs_session(&args.command) && !ctx.session.is_authenticated(Utc::now())? {
    ctx.logout()?;
    return Err(eyre!("Not signed in. Run `storedesk login <email> --password <password>`"));
  }

  // Returning lets the log guard flush before the process exits
  let code = finish(&ctx, run(&ctx, args.command).await)?;
  Ok(ExitCode::from(code))
}

#[cfg(test)]
mod tests {
  use super::*;
  use storedesk::config::ApiConfig;

  fn context() -> AdminContext {
    let config = Config {
      api: ApiConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        ..ApiConfig::default()
      },
      ..Config::default()
    };
    AdminContext::new(
      &config,
      Session::in_memory(),
      Arc::new(TerminalNotifier),
      Arc::new(LogNavigator),
    )
    .unwrap()
  }

  #[test]
  fn test_failed_command_returns_failure_code() {
    let ctx = context();
    let failed = Err(ApiError::Network {
      message: "connection refused".to_string(),
    });

    assert_eq!(finish(&ctx, failed).unwrap(), 1);
    assert_eq!(finish(&ctx, Ok(())).unwrap(), 0);
  }

  #[test]
  fn test_rejected_session_is_cleared() {
    let ctx = context();
    ctx.session.set_token("jwt").unwrap();

    assert!(finish(&ctx, Err(ApiError::Unauthorized)).is_err());
    assert_eq!(ctx.session.token().unwrap(), None);
  }
}
