use fibre_inject::{resolve, Component, Container, Lifecycle, Members};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
#[derive(Default)]
struct ReportService {
  logger: Option<Arc<dyn Logger>>,
}

impl Component for ReportService {
  fn members(members: &mut Members<Self>) {
    members.inject("logger", |s: &mut Self, logger: Arc<dyn Logger>| s.logger = Some(logger));
  }
}

impl ReportService {
  fn generate_report(&self) {
    if let Some(logger) = &self.logger {
      logger.log("Starting report generation.");
      logger.log("Finished report generation.");
    }
  }
}

fn main() -> fibre_inject::Result<()> {
  let container = Container::new();

  // --- Registration ---

  // The container stores the ConsoleLogger but serves it as Arc<dyn Logger>.
  container
    .register::<dyn Logger>()
    .lifecycle(Lifecycle::Singleton)
    .constructor(|| Ok::<_, std::convert::Infallible>(Arc::new(ConsoleLogger) as Arc<dyn Logger>))
    .register()?;

  // ReportService never creates its logger: the container injects it.
  container.add_singleton::<ReportService>();

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = resolve!(container, ReportService);

  println!("Using the service...");
  report_service.generate_report();
  Ok(())
}
