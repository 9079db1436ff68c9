//! Node-facade end-to-end scenarios: homogeneous clusters where every
//! node hosts all three roles behind the in-process transport.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use decree::{ChannelTransport, Committed, Entry, Error, Node, Transport};

/// Election window plus margin; proposing earlier would only queue.
const ELECTION_SETTLE: Duration = Duration::from_millis(700);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cluster(ids: &[usize]) -> HashMap<usize, Node> {
    let mut transports = ChannelTransport::group(ids);
    ids.iter()
        .map(|&id| {
            let peers: Vec<usize> = ids.iter().copied().filter(|&peer| peer != id).collect();
            let transport: Arc<dyn Transport> = Arc::new(transports.remove(&id).unwrap());
            (id, Node::new(id, &peers, transport))
        })
        .collect()
}

async fn next_entry(committed: &mut Committed) -> Entry {
    tokio::time::timeout(Duration::from_secs(10), committed.recv())
        .await
        .expect("timed out waiting for a decision")
        .expect("committed stream closed")
}

#[tokio::test(flavor = "multi_thread")]
async fn node_commits_a_single_value() {
    init_logging();
    let nodes = cluster(&[1, 2, 3]);
    for node in nodes.values() {
        node.start();
    }

    tokio::time::sleep(ELECTION_SETTLE).await;
    nodes[&3].propose(b"hello".to_vec()).await.unwrap();

    let mut committed = nodes[&3].committed();
    let entry = next_entry(&mut committed).await;
    assert_eq!(
        entry,
        Entry {
            slot: 0,
            value: b"hello".to_vec(),
        }
    );

    for node in nodes.values() {
        node.stop();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn node_runs_multiple_decrees() {
    init_logging();
    let nodes = cluster(&[1, 2, 3]);
    for node in nodes.values() {
        node.start();
    }

    tokio::time::sleep(ELECTION_SETTLE).await;
    for value in [b"alpha".as_slice(), b"beta", b"gamma"] {
        nodes[&3].propose(value.to_vec()).await.unwrap();
    }

    let mut committed = nodes[&3].committed();
    let mut decided = HashMap::new();
    for _ in 0..3 {
        let entry = next_entry(&mut committed).await;
        decided.insert(entry.slot, entry.value);
    }
    assert_eq!(decided[&0], b"alpha".to_vec());
    assert_eq!(decided[&1], b"beta".to_vec());
    assert_eq!(decided[&2], b"gamma".to_vec());

    for node in nodes.values() {
        node.stop();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn every_node_observes_the_decision() {
    init_logging();
    let nodes = cluster(&[1, 2]);
    for node in nodes.values() {
        node.start();
    }

    tokio::time::sleep(ELECTION_SETTLE).await;
    nodes[&2].propose(b"from-leader".to_vec()).await.unwrap();

    for id in [1, 2] {
        let mut committed = nodes[&id].committed();
        let entry = next_entry(&mut committed).await;
        assert_eq!(entry.value, b"from-leader".to_vec(), "node {}", id);
    }

    for node in nodes.values() {
        node.stop();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn propose_after_stop_is_rejected() {
    init_logging();
    let nodes = cluster(&[1]);
    nodes[&1].start();
    nodes[&1].stop();

    let result = nodes[&1].propose(b"late".to_vec()).await;
    assert!(matches!(result, Err(Error::Stopped)));
}

#[tokio::test(flavor = "multi_thread")]
async fn committed_stream_closes_on_stop() {
    init_logging();
    let nodes = cluster(&[1]);
    nodes[&1].start();
    let mut committed = nodes[&1].committed();

    nodes[&1].stop();
    let closed = tokio::time::timeout(Duration::from_secs(3), committed.recv())
        .await
        .expect("committed stream did not close in time");
    assert_eq!(closed, None);
}
