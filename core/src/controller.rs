//! Port controller - owner of the published port state.
//!
//! A single actor task owns [`ControllerState`] and is the only place it is
//! modified. Callers talk to it through a cheap, cloneable
//! [`PortController`] handle and observe state through a watch channel.
//!
//! Listing subprocesses never run on the actor: each scan is a separate task
//! that hands its parsed result back over a channel. Results are applied in
//! the order scans finish, so when scans overlap the last one to finish
//! decides the published snapshot.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::{PortProcess, Snapshot};
use crate::error::{Error, Result};
use crate::parser;
use crate::ports::{ListingTool, Terminator};

/// Default auto-refresh period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

const COMMAND_BUFFER: usize = 32;

/// Controller behavior settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Period of the background scan. The first scan runs immediately.
    /// `None` (or a zero period) disables background scanning entirely.
    pub refresh_interval: Option<Duration>,
}

impl ControllerOptions {
    /// Options without background scanning; scans only run on request.
    pub fn manual() -> Self {
        Self {
            refresh_interval: None,
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            refresh_interval: Some(DEFAULT_REFRESH_INTERVAL),
        }
    }
}

/// The state published to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    /// Listening processes from the latest completed scan, ascending by port.
    pub processes: Snapshot,
    /// Whether at least one scan is in flight.
    pub is_scanning: bool,
    /// Message describing the most recent scan or kill failure.
    pub last_error: Option<String>,
    /// Incremented on every publication.
    pub generation: u64,
}

enum Command {
    ScanAll {
        reply: oneshot::Sender<Snapshot>,
    },
    RecordError {
        message: String,
        ack: oneshot::Sender<()>,
    },
}

struct ScanCompletion {
    result: Result<Snapshot>,
    reply: Option<oneshot::Sender<Snapshot>>,
}

/// Handle to the port controller.
///
/// Dropping every handle stops the controller.
pub struct PortController<L, T> {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ControllerState>,
    listing: Arc<L>,
    terminator: Arc<T>,
}

impl<L, T> Clone for PortController<L, T> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            state: self.state.clone(),
            listing: Arc::clone(&self.listing),
            terminator: Arc::clone(&self.terminator),
        }
    }
}

impl<L, T> PortController<L, T>
where
    L: ListingTool + 'static,
    T: Terminator + 'static,
{
    /// Start the controller on the current tokio runtime.
    pub fn spawn(listing: L, terminator: T, options: ControllerOptions) -> Self {
        let listing = Arc::new(listing);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ControllerState::default());

        let ticker = options
            .refresh_interval
            .filter(|period| !period.is_zero())
            .map(|period| {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });

        let actor = ControllerActor {
            listing: Arc::clone(&listing),
            state: state_tx,
            completions: completion_tx,
            in_flight: 0,
        };
        tokio::spawn(actor.run(command_rx, completion_rx, ticker));

        Self {
            commands: command_tx,
            state: state_rx,
            listing,
            terminator: Arc::new(terminator),
        }
    }

    /// Scan every listening TCP port and publish the result.
    ///
    /// A failed listing publishes an empty snapshot and records the error in
    /// [`ControllerState::last_error`]; it is not returned to the caller.
    /// The returned snapshot has been published by the time this resolves.
    pub async fn scan_all(&self) -> Snapshot {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::ScanAll { reply }).await.is_err() {
            warn!("Controller stopped, scan request dropped");
            return Snapshot::new();
        }
        response.await.unwrap_or_default()
    }

    /// Look up the process listening on `port`.
    ///
    /// Does not touch the published state. A failed listing reads as no
    /// listener.
    pub async fn scan_port(&self, port: u16) -> Option<PortProcess> {
        match self.listing.list_port(port).await {
            Ok(raw) => parser::parse(&raw).into_iter().find(|p| p.port == port),
            Err(e) => {
                debug!(port = port, error = %e, "Port lookup failed");
                None
            }
        }
    }

    /// Force kill `process`, then rescan.
    ///
    /// Returns `true` once the follow-up scan has been published. On failure
    /// the error is recorded in [`ControllerState::last_error`], the snapshot
    /// is left as it was, and `false` is returned.
    pub async fn kill_process(&self, process: &PortProcess) -> bool {
        match self.terminator.terminate(process.pid).await {
            Ok(()) => {
                info!(
                    pid = process.pid,
                    port = process.port,
                    name = %process.process_name,
                    "Process killed"
                );
                self.scan_all().await;
                true
            }
            Err(e) => {
                warn!(pid = process.pid, error = %e, "Failed to kill process");
                let message = if matches!(e, Error::KillFailed { .. }) {
                    e.to_string()
                } else {
                    format!("Failed to kill process {}: {}", process.pid, e)
                };
                self.record_error(message).await;
                false
            }
        }
    }

    /// Kill whatever listens on `port`.
    ///
    /// Returns `false` without attempting a kill when nothing listens there.
    pub async fn kill_process_on_port(&self, port: u16) -> bool {
        match self.scan_port(port).await {
            Some(process) => self.kill_process(&process).await,
            None => {
                debug!(port = port, "No listener to kill");
                false
            }
        }
    }

    async fn record_error(&self, message: String) {
        let (ack, done) = oneshot::channel();
        if self
            .commands
            .send(Command::RecordError { message, ack })
            .await
            .is_ok()
        {
            let _ = done.await;
        }
    }
}

impl<L, T> PortController<L, T> {
    /// Current published state.
    pub fn state(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    /// Current published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().processes.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    pub fn is_scanning(&self) -> bool {
        self.state.borrow().is_scanning
    }

    /// Receiver notified on every publication.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.clone()
    }
}

struct ControllerActor<L> {
    listing: Arc<L>,
    state: watch::Sender<ControllerState>,
    completions: mpsc::UnboundedSender<ScanCompletion>,
    in_flight: usize,
}

impl<L> ControllerActor<L>
where
    L: ListingTool + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut completions: mpsc::UnboundedReceiver<ScanCompletion>,
        mut ticker: Option<Interval>,
    ) {
        debug!("Port controller started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(completion) = completions.recv() => self.complete_scan(completion),
                _ = next_tick(&mut ticker) => self.start_scan(None),
            }
        }

        debug!("Port controller stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::ScanAll { reply } => self.start_scan(Some(reply)),
            Command::RecordError { message, ack } => {
                self.state.send_modify(|state| {
                    state.last_error = Some(message);
                    state.generation += 1;
                });
                let _ = ack.send(());
            }
        }
    }

    fn start_scan(&mut self, reply: Option<oneshot::Sender<Snapshot>>) {
        self.in_flight += 1;
        self.state.send_modify(|state| {
            state.is_scanning = true;
            state.last_error = None;
            state.generation += 1;
        });

        let listing = Arc::clone(&self.listing);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = listing.list_all().await.map(|raw| parser::parse(&raw));
            let _ = completions.send(ScanCompletion { result, reply });
        });
    }

    fn complete_scan(&mut self, completion: ScanCompletion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let is_scanning = self.in_flight > 0;

        let processes = match completion.result {
            Ok(processes) => {
                debug!(count = processes.len(), "Scan completed");
                let published = processes.clone();
                self.state.send_modify(|state| {
                    state.processes = published;
                    state.is_scanning = is_scanning;
                    state.last_error = None;
                    state.generation += 1;
                });
                processes
            }
            Err(e) => {
                warn!(error = %e, "Scan failed");
                self.state.send_modify(|state| {
                    state.processes = Snapshot::new();
                    state.is_scanning = is_scanning;
                    state.last_error = Some(e.to_string());
                    state.generation += 1;
                });
                Snapshot::new()
            }
        };

        if let Some(reply) = completion.reply {
            let _ = reply.send(processes);
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    const HEADER: &str =
        "COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME";

    fn listing_text(entries: &[(&str, u32, u16)]) -> String {
        let mut out = String::from(HEADER);
        for (name, pid, port) in entries {
            out.push_str(&format!(
                "\n{} {} user 19u IPv4 0x1234567890abcdef 0t0 TCP *:{} (LISTEN)",
                name, pid, port
            ));
        }
        out.push('\n');
        out
    }

    #[derive(Clone)]
    enum Reply {
        Output(String),
        Fail,
    }

    impl Reply {
        fn into_result(self) -> Result<String> {
            match self {
                Reply::Output(text) => Ok(text),
                Reply::Fail => Err(Error::CommandFailed("lsof: not found".to_string())),
            }
        }
    }

    /// Mock listing tool for testing.
    #[derive(Clone)]
    struct MockListing {
        current: Arc<Mutex<Reply>>,
        scripted: Arc<Mutex<VecDeque<(Duration, Reply)>>>,
        calls: Arc<AtomicUsize>,
    }

    impl MockListing {
        fn new(entries: &[(&str, u32, u16)]) -> Self {
            Self {
                current: Arc::new(Mutex::new(Reply::Output(listing_text(entries)))),
                scripted: Arc::new(Mutex::new(VecDeque::new())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn set(&self, reply: Reply) {
            *self.current.lock() = reply;
        }

        /// Queue a one-off reply for the next `list_all` call.
        fn script(&self, delay: Duration, reply: Reply) {
            self.scripted.lock().push_back((delay, reply));
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn next_reply(&self) -> (Duration, Reply) {
            let scripted = self.scripted.lock().pop_front();
            scripted.unwrap_or_else(|| (Duration::ZERO, self.current.lock().clone()))
        }
    }

    impl ListingTool for MockListing {
        async fn list_all(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, reply) = self.next_reply();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            reply.into_result()
        }

        async fn list_port(&self, _port: u16) -> Result<String> {
            let reply = self.current.lock().clone();
            reply.into_result()
        }
    }

    /// Mock terminator that records PIDs and swaps the listing on success.
    #[derive(Clone)]
    struct MockTerminator {
        killed: Arc<Mutex<Vec<u32>>>,
        fail: bool,
        after_kill: Option<(MockListing, String)>,
    }

    impl MockTerminator {
        fn succeeding(listing: &MockListing, after: &[(&str, u32, u16)]) -> Self {
            Self {
                killed: Arc::new(Mutex::new(Vec::new())),
                fail: false,
                after_kill: Some((listing.clone(), listing_text(after))),
            }
        }

        fn failing() -> Self {
            Self {
                killed: Arc::new(Mutex::new(Vec::new())),
                fail: true,
                after_kill: None,
            }
        }

        fn killed(&self) -> Vec<u32> {
            self.killed.lock().clone()
        }
    }

    impl Terminator for MockTerminator {
        async fn terminate(&self, pid: u32) -> Result<()> {
            self.killed.lock().push(pid);
            if self.fail {
                return Err(Error::KillFailed {
                    pid,
                    reason: "Operation not permitted".to_string(),
                });
            }
            if let Some((listing, after)) = &self.after_kill {
                listing.set(Reply::Output(after.clone()));
            }
            Ok(())
        }
    }

    fn manual(
        listing: &MockListing,
        terminator: &MockTerminator,
    ) -> PortController<MockListing, MockTerminator> {
        PortController::spawn(listing.clone(), terminator.clone(), ControllerOptions::manual())
    }

    #[tokio::test]
    async fn test_initial_state_empty() {
        let listing = MockListing::new(&[("node", 1234, 3000)]);
        let controller = manual(&listing, &MockTerminator::failing());

        let state = controller.state();
        assert!(state.processes.is_empty());
        assert!(!state.is_scanning);
        assert!(state.last_error.is_none());
        assert_eq!(listing.calls(), 0);
    }

    #[tokio::test]
    async fn test_scan_all_publishes_snapshot() {
        let listing = MockListing::new(&[
            ("java", 100, 8080),
            ("node", 200, 3000),
            ("vite", 300, 5173),
        ]);
        let controller = manual(&listing, &MockTerminator::failing());

        let snapshot = controller.scan_all().await;
        let ports: Vec<u16> = snapshot.iter().map(|p| p.port).collect();
        assert_eq!(ports, vec![3000, 5173, 8080]);

        let state = controller.state();
        assert_eq!(state.processes, snapshot);
        assert!(!state.is_scanning);
        assert!(state.last_error.is_none());
        assert!(state.generation >= 2);
    }

    #[tokio::test]
    async fn test_scan_all_failure_clears_snapshot() {
        let listing = MockListing::new(&[("node", 1234, 3000)]);
        let controller = manual(&listing, &MockTerminator::failing());

        assert_eq!(controller.scan_all().await.len(), 1);

        listing.set(Reply::Fail);
        let snapshot = controller.scan_all().await;
        assert!(snapshot.is_empty());
        assert!(controller.snapshot().is_empty());
        let error = controller.last_error().unwrap();
        assert!(error.contains("lsof: not found"));

        // The next scan clears the error
        listing.set(Reply::Output(listing_text(&[("node", 1234, 3000)])));
        assert_eq!(controller.scan_all().await.len(), 1);
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn test_scan_port() {
        let listing = MockListing::new(&[("node", 1234, 3000), ("nginx", 1, 80)]);
        let controller = manual(&listing, &MockTerminator::failing());

        let found = controller.scan_port(3000).await.unwrap();
        assert_eq!(found, PortProcess::new(3000, 1234, "node"));
        assert_eq!(found.process_name, "node");

        assert!(controller.scan_port(9999).await.is_none());

        // Point lookups never touch published state
        assert!(controller.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_scan_port_failure_is_none() {
        let listing = MockListing::new(&[]);
        listing.set(Reply::Fail);
        let controller = manual(&listing, &MockTerminator::failing());

        assert!(controller.scan_port(3000).await.is_none());
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn test_kill_process_rescans() {
        let listing = MockListing::new(&[("node", 1234, 3000), ("nginx", 1, 80)]);
        let terminator = MockTerminator::succeeding(&listing, &[("nginx", 1, 80)]);
        let controller = manual(&listing, &terminator);

        let snapshot = controller.scan_all().await;
        let node = snapshot.iter().find(|p| p.port == 3000).unwrap().clone();

        assert!(controller.kill_process(&node).await);
        assert_eq!(terminator.killed(), vec![1234]);

        // The follow-up scan is published before kill_process returns
        let snapshot = controller.snapshot();
        assert!(!snapshot.contains(&PortProcess::new(3000, 1234, "")));
        assert_eq!(snapshot, vec![PortProcess::new(80, 1, "nginx")]);
    }

    #[tokio::test]
    async fn test_kill_process_failure_keeps_snapshot() {
        let listing = MockListing::new(&[("node", 1234, 3000)]);
        let terminator = MockTerminator::failing();
        let controller = manual(&listing, &terminator);

        let before = controller.scan_all().await;
        let calls = listing.calls();

        assert!(!controller.kill_process(&before[0]).await);
        assert_eq!(terminator.killed(), vec![1234]);

        let state = controller.state();
        assert_eq!(state.processes, before);
        let error = state.last_error.unwrap();
        assert_eq!(error, "Failed to kill process 1234: Operation not permitted");

        // No rescan after a failed kill
        assert_eq!(listing.calls(), calls);
    }

    #[tokio::test]
    async fn test_kill_process_rescan_failure() {
        let listing = MockListing::new(&[("node", 1234, 3000)]);
        let terminator = MockTerminator::succeeding(&listing, &[]);
        let controller = manual(&listing, &terminator);

        let before = controller.scan_all().await;
        listing.script(Duration::ZERO, Reply::Fail);

        // The kill itself succeeded, so the call reports success
        assert!(controller.kill_process(&before[0]).await);
        assert_eq!(terminator.killed(), vec![1234]);

        let state = controller.state();
        assert!(state.processes.is_empty());
        assert!(state.last_error.unwrap().contains("lsof: not found"));
    }

    #[tokio::test]
    async fn test_kill_process_on_port_without_listener() {
        let listing = MockListing::new(&[("nginx", 1, 80)]);
        let terminator = MockTerminator::succeeding(&listing, &[]);
        let controller = manual(&listing, &terminator);

        assert!(!controller.kill_process_on_port(3000).await);
        assert!(terminator.killed().is_empty());
    }

    #[tokio::test]
    async fn test_kill_process_on_port() {
        let listing = MockListing::new(&[("node", 1234, 3000), ("nginx", 1, 80)]);
        let terminator = MockTerminator::succeeding(&listing, &[("nginx", 1, 80)]);
        let controller = manual(&listing, &terminator);

        assert!(controller.kill_process_on_port(3000).await);
        assert_eq!(terminator.killed(), vec![1234]);
        assert!(controller.snapshot().iter().all(|p| p.port != 3000));
        assert!(controller.scan_port(3000).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_completed_scan_wins() {
        let listing = MockListing::new(&[]);
        let controller = manual(&listing, &MockTerminator::failing());

        // The first scan starts first but finishes last
        listing.script(
            Duration::from_millis(100),
            Reply::Output(listing_text(&[("slow", 10, 3000)])),
        );
        listing.script(
            Duration::from_millis(10),
            Reply::Output(listing_text(&[("fast", 20, 4000)])),
        );

        let (first, second) = tokio::join!(controller.scan_all(), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            controller.scan_all().await
        });

        assert_eq!(first, vec![PortProcess::new(3000, 10, "slow")]);
        assert_eq!(second, vec![PortProcess::new(4000, 20, "fast")]);

        let state = controller.state();
        assert_eq!(state.processes, first);
        assert!(!state.is_scanning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_success_clears_earlier_failure() {
        let listing = MockListing::new(&[]);
        let controller = manual(&listing, &MockTerminator::failing());

        // The first scan fails quickly while the second is still running
        listing.script(Duration::from_millis(10), Reply::Fail);
        listing.script(
            Duration::from_millis(100),
            Reply::Output(listing_text(&[("node", 1, 3000)])),
        );

        let (first, second) = tokio::join!(controller.scan_all(), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            controller.scan_all().await
        });

        assert!(first.is_empty());
        assert_eq!(second, vec![PortProcess::new(3000, 1, "node")]);

        let state = controller.state();
        assert_eq!(state.processes, second);
        assert!(state.last_error.is_none());
        assert!(!state.is_scanning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scanning_flag_while_in_flight() {
        let listing = MockListing::new(&[]);
        let controller = manual(&listing, &MockTerminator::failing());
        listing.script(Duration::from_secs(1), Reply::Output(listing_text(&[])));

        let background = controller.clone();
        let scan = tokio::spawn(async move { background.scan_all().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(controller.is_scanning());

        scan.await.unwrap();
        assert!(!controller.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh() {
        let listing = MockListing::new(&[("node", 1234, 3000)]);
        let controller = PortController::spawn(
            listing.clone(),
            MockTerminator::failing(),
            ControllerOptions::default(),
        );

        // First scan runs at startup, not after the first period
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(listing.calls(), 1);
        assert_eq!(controller.snapshot().len(), 1);

        listing.set(Reply::Output(listing_text(&[])));
        tokio::time::sleep(DEFAULT_REFRESH_INTERVAL).await;
        assert_eq!(listing.calls(), 2);
        assert!(controller.snapshot().is_empty());

        tokio::time::sleep(DEFAULT_REFRESH_INTERVAL).await;
        assert_eq!(listing.calls(), 3);
    }

    #[tokio::test]
    async fn test_subscribe_sees_updates() {
        let listing = MockListing::new(&[("node", 1234, 3000)]);
        let controller = manual(&listing, &MockTerminator::failing());
        let mut updates = controller.subscribe();
        updates.borrow_and_update();

        controller.scan_all().await;

        assert!(updates.has_changed().unwrap());
        let state = updates.borrow_and_update().clone();
        assert_eq!(state.processes.len(), 1);
    }

    #[tokio::test]
    async fn test_stops_when_handles_dropped() {
        let listing = MockListing::new(&[]);
        let controller = manual(&listing, &MockTerminator::failing());
        let mut updates = controller.subscribe();

        drop(controller);

        // The actor drops the sender once the last handle is gone
        assert!(updates.changed().await.is_err());
    }
}
