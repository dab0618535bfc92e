mod asset_cache;
mod utxo_cache;
