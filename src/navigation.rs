use tracing::info;

/// Moves the application to another view
pub trait Navigator: Send + Sync {
    /// Transition the visible view to `route`
    fn go(&self, route: &str);
}

/// Source of the route users land on after signing in
pub trait RouteRegistry: Send + Sync {
    fn default_route(&self) -> String;
}

/// Registry with a fixed default route
#[derive(Debug, Clone)]
pub struct StaticRouteRegistry {
    route: String,
}

impl StaticRouteRegistry {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
        }
    }
}

impl RouteRegistry for StaticRouteRegistry {
    fn default_route(&self) -> String {
        self.route.clone()
    }
}

/// Navigator for headless runs: records the destination in the log
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn go(&self, route: &str) {
        info!(route = %route, "Navigating");
    }
}
