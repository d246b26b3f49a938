//! ConnectivityOracle port - ネットワーク到達性の問い合わせ

/// ConnectivityOracle は問い合わせ時点でネットワークが使えるかを答える
///
/// Called on the control line (before every dispatch) and on the executor
/// line (after every transfer), so implementations must be cheap and must not
/// block.
pub trait ConnectivityOracle: Send + Sync {
    fn is_connected(&self) -> bool;
}
