use upkeep::Endpoint;
use upkeep::StatusSnapshot;
use upkeep::monitoring::Reachability;

/// Text shown in the status line
pub const STATUS_STARTING: &str = "Starting...";
pub const STATUS_REFRESHING: &str = "Refreshing...";
pub const STATUS_MONITORING: &str = "Monitoring...";

/// What the terminal shows: one line per server, a counter and a status line
#[derive(Debug, Clone)]
pub struct StatusBoard {
    rows: Vec<(String, Reachability)>,
    status: String,
}

impl StatusBoard {
    pub fn new(endpoints: &[Endpoint]) -> Self {
        let mut board = Self { rows: Vec::new(), status: STATUS_STARTING.into() };
        board.set_endpoints(endpoints);
        board
    }

    /// Replace the server list, statuses of unchanged servers are kept
    pub fn set_endpoints(&mut self, endpoints: &[Endpoint]) {
        self.rows = endpoints
            .iter()
            .map(|endpoint| {
                let status = self
                    .rows
                    .iter()
                    .find(|(id, _)| id == endpoint.as_str())
                    .map(|(_, status)| *status)
                    .unwrap_or(Reachability::Unknown);
                (endpoint.to_string(), status)
            })
            .collect();
    }

    pub fn apply(&mut self, snapshot: &StatusSnapshot) {
        for (id, status) in &mut self.rows {
            let observed = snapshot.status_of(id);
            if observed != Reachability::Unknown {
                *status = observed;
            }
        }
        self.status = STATUS_MONITORING.into();
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn online_count(&self) -> usize {
        self.rows.iter().filter(|(_, status)| *status == Reachability::Online).count()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (id, status) in &self.rows {
            out.push_str(&format!("{id}: {status}\n"));
        }
        out.push_str(&format!("Online: {} / {}\n", self.online_count(), self.rows.len()));
        out.push_str(&format!("[{}]", self.status));
        out
    }
}
