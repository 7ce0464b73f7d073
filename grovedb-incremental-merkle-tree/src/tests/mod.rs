
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{
    LeafHasher, NodeHasher, SequentialWorkHasher, Sha256Hasher, Tree, TreeConfig,
    ValidatorConfig, ValueLeaves,
};

// SHA-256 digests over 32-byte leaves holding their index as little endian.
const H_23: &str = "0094579cfc7b716038d416a311465309bea202baa922b224a7b08f01599642fb";
const H_67: &str = "fa670379e5c2212ed93ff09769622f81f98a91e1ec8fb114d607dd25220b9088";
const H_0123: &str = "ba94ffe7edabf26ef12736f8eb5ce74d15bedb6af61444ae2906e926b1a95084";
const ROOT_8: &str = "89a0f1577268cc19b0a39c7a69f804fd140640c699585eb635ebb03c06154cce";
const ROOT_9: &str = "cb71c80ee780788eedb819ec125a41e0cde57bd0955cdd3157ca363193ab5ff1";
const ROOT_10: &str = "59f32a43534fe4c4c0966421aef624267cdf65bd11f74998c60f27c7caccb12d";
const ROOT_15: &str = "b9746fb884ed07041c5cbb3bb5526e1383928e832a8385e08db995966889b5a8";

// Same leaves, hashed with the sequential work leaf hasher.
const SEQ_LEAF_0: &str = "66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925";
const SEQ_LEAF_1: &str = "8877377eae7d7a824d658c6035955535504abb5a517183f28b012495d73e1666";
const SEQ_LEAF_2: &str = "838d183323751f3512ef22eee7ee284eda4e8d736ca70387ce68ee44ccbb0483";
const SEQ_LEAF_5: &str = "03085fced9119406c955dc302885a509bf81972ead5fb8b1d87dd3308f9830a2";
const SEQ_LEAF_7: &str = "2b4b14ec31fcd73cb55c8966bb8591ec57e617cfefd60df0f89d51b8bfd60df1";
const SEQ_LEAF_9: &str = "227fe68b5e59358c69e459b06fba730d6e66ca5ba895179dc9dd710ef25006cd";
const SEQ_H_23: &str = "9877cb740c0c4cd5a9a18df2ee05fae87951c73b7bd97cdcde297263783375da";
const SEQ_H_45: &str = "628cd22dd9f320d3c32f9c4e830f00844e393a965d3c134147f73cb5f529b586";
const SEQ_H_67: &str = "64276da1ef80b4d466e654c5808c4ea3f2c57dda04499e0f495ac4593c746993";
const SEQ_H_0123: &str = "c3831849e0ae67538cb54a4de0729118685c41822f714f7c466ee641380d01db";
const SEQ_ROOT_8: &str = "02ce397ec513f034dd6ec5dce3cdb8bfcf10f400a9979cb03abf52d3b5f6c88b";
const SEQ_ROOT_10: &str = "b52feaee4c84a2762112496115d927eae01122d61b0474fc74b288f2139f7b69";

const ZERO: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// 32-byte leaf value holding `i` as little endian.
fn leaf(i: u64) -> Vec<u8> {
    let mut value = vec![0u8; 32];
    value[..8].copy_from_slice(&i.to_le_bytes());
    value
}

fn leaf_hex(i: u64) -> String {
    hex::encode(leaf(i))
}

fn sequential_config() -> TreeConfig {
    TreeConfig::default().with_leaf_hasher(Arc::new(SequentialWorkHasher::new()))
}

/// Build a tree over `leaf(0)..leaf(count)`.
fn build_tree(config: TreeConfig, count: u64) -> Tree {
    let mut tree = Tree::new(config);
    for i in 0..count {
        tree.add(&leaf(i));
    }
    tree
}

/// Root and proof of `count` leaves as hex strings.
fn root_and_proof_hex(config: TreeConfig, count: u64) -> (String, Vec<String>) {
    let (root, proof) = build_tree(config, count).root_and_proof().unwrap();
    (hex::encode(root), proof.iter().map(hex::encode).collect())
}

fn leaves_map(indices: &[u64]) -> BTreeMap<u64, Vec<u8>> {
    indices.iter().map(|i| (*i, leaf(*i))).collect()
}

fn decode_all(items: &[&str]) -> Vec<Vec<u8>> {
    items.iter().map(|item| hex::decode(item).unwrap()).collect()
}

/// Node hasher that concatenates its inputs, one byte per padding node.
#[derive(Debug)]
struct ConcatHasher;

impl NodeHasher for ConcatHasher {
    fn hash_into(&self, out: &mut Vec<u8>, left: &[u8], right: &[u8]) {
        out.clear();
        out.extend_from_slice(left);
        out.extend_from_slice(right);
    }

    fn size(&self) -> usize {
        1
    }
}

fn concat_config() -> TreeConfig {
    TreeConfig::default()
        .with_hasher(Arc::new(ConcatHasher))
        .with_leaf_hasher(Arc::new(ValueLeaves::new(1)))
}

/// SHA-256 node hasher counting its calls.
#[derive(Debug, Default)]
struct CountingHasher {
    inner: Sha256Hasher,
    calls: AtomicUsize,
}

impl CountingHasher {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NodeHasher for CountingHasher {
    fn hash_into(&self, out: &mut Vec<u8>, left: &[u8], right: &[u8]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.hash_into(out, left, right);
    }

    fn size(&self) -> usize {
        self.inner.size()
    }
}

fn validator_config(config: &TreeConfig) -> ValidatorConfig {
    ValidatorConfig::from(config)
}

/// Sequential work digest of a single leaf.
fn sequential_leaf(value: &[u8], siblings: &[&[u8]]) -> Vec<u8> {
    SequentialWorkHasher::new().hash(value, siblings)
}
