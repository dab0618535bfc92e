mod apply;
mod mempool;
mod reorg;
