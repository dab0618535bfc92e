mod mempool;
mod notification;
