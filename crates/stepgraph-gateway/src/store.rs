use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use stepgraph_core::context::{RunResult, RunStatus, State};
use stepgraph_engine::GraphExecutor;

/// Short random id: the first `len` hex digits of a v4 UUID.
fn short_id(len: usize) -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(len);
    id
}

/// In-memory graphs keyed by generated id.
pub struct GraphStore {
    graphs: Mutex<HashMap<String, GraphExecutor>>,
    id_length: usize,
}

impl GraphStore {
    pub fn new(id_length: usize) -> Self {
        Self {
            graphs: Mutex::new(HashMap::new()),
            id_length,
        }
    }

    /// Store a graph and return its new id.
    pub fn insert(&self, executor: GraphExecutor) -> String {
        let mut graphs = self.graphs.lock().unwrap();
        let mut id = short_id(self.id_length);
        while graphs.contains_key(&id) {
            id = short_id(self.id_length);
        }
        graphs.insert(id.clone(), executor);
        id
    }

    /// Executors share their definition, so the clone is cheap.
    pub fn get(&self, id: &str) -> Option<GraphExecutor> {
        self.graphs.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.graphs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A finished run as stored and served by the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub run_id: String,
    pub graph_id: String,
    pub status: RunStatus,
    pub final_state: State,
    pub logs: Vec<String>,
    pub steps_executed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// In-memory run results keyed by generated id. Each record carries an
/// insertion sequence number that breaks ties between equal start times.
pub struct RunStore {
    runs: Mutex<HashMap<String, (u64, RunRecord)>>,
    next_seq: AtomicU64,
    id_length: usize,
}

impl RunStore {
    pub fn new(id_length: usize) -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            id_length,
        }
    }

    /// Store a finished run and return its record.
    pub fn record(
        &self,
        graph_id: &str,
        result: RunResult,
        started_at: DateTime<Utc>,
    ) -> RunRecord {
        let mut runs = self.runs.lock().unwrap();
        let mut run_id = short_id(self.id_length);
        while runs.contains_key(&run_id) {
            run_id = short_id(self.id_length);
        }
        let record = RunRecord {
            run_id: run_id.clone(),
            graph_id: graph_id.to_string(),
            status: result.status,
            final_state: result.final_state,
            logs: result.logs,
            steps_executed: result.steps_executed,
            started_at,
            finished_at: Utc::now(),
        };
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        runs.insert(run_id, (seq, record.clone()));
        record
    }

    pub fn get(&self, run_id: &str) -> Option<RunRecord> {
        self.runs
            .lock()
            .unwrap()
            .get(run_id)
            .map(|(_, record)| record.clone())
    }

    /// Ids of stored runs, oldest first.
    pub fn list(&self) -> Vec<String> {
        let runs = self.runs.lock().unwrap();
        let mut records: Vec<&(u64, RunRecord)> = runs.values().collect();
        records.sort_by_key(|(seq, r)| (r.started_at, *seq));
        records.iter().map(|(_, r)| r.run_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepgraph_engine::GraphDefinition;

    fn result(steps: usize) -> RunResult {
        RunResult {
            final_state: State::new(),
            logs: vec!["Starting workflow at a".into()],
            steps_executed: steps,
            status: RunStatus::Completed,
        }
    }

    #[test]
    fn test_short_id_length() {
        assert_eq!(short_id(8).len(), 8);
        assert!(short_id(8).chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_graph_store_insert_get() {
        let store = GraphStore::new(8);
        assert!(store.is_empty());
        let id = store.insert(GraphExecutor::new(GraphDefinition::new()));
        assert_eq!(id.len(), 8);
        assert!(store.get(&id).is_some());
        assert!(store.get("missing").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_run_store_record_and_list() {
        let store = RunStore::new(8);
        let first = store.record("g1", result(1), Utc::now());
        let second = store.record("g1", result(2), Utc::now());

        assert_ne!(first.run_id, second.run_id);
        let fetched = store.get(&second.run_id).unwrap();
        assert_eq!(fetched.steps_executed, 2);
        assert_eq!(fetched.graph_id, "g1");
        assert!(fetched.finished_at >= fetched.started_at);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn test_run_store_list_same_start_keeps_insertion_order() {
        let store = RunStore::new(8);
        let started_at = Utc::now();
        let ids: Vec<String> = (0..16)
            .map(|i| store.record("g1", result(i), started_at).run_id)
            .collect();
        assert_eq!(store.list(), ids);
    }

    #[test]
    fn test_run_store_list_orders_by_start_time() {
        let store = RunStore::new(8);
        let now = Utc::now();
        let late = store.record("g1", result(1), now).run_id;
        let early = store.record("g1", result(2), now - chrono::Duration::seconds(5)).run_id;
        assert_eq!(store.list(), vec![early, late]);
    }
}
