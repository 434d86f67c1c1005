/// Structured error handling for SwarmBot
///
/// Per-bot and per-wallet failures are isolated: they are surfaced through
/// log streams and never propagate across bots or funding pipelines. Only
/// initialization failures (config, wallet store, scheduler construction)
/// reach the caller as hard errors.

// =============================================================================
// MAIN ERROR TYPE
// =============================================================================

#[derive(Debug, Clone)]
pub enum SwarmBotError {
    // Invalid amount/duration/count - rejected before any state mutation
    Configuration(ConfigurationError),

    // RPC / transfer / confirmation failures
    Network(NetworkError),

    // A throw inside a strategy tick - caught and logged, never propagated
    Strategy(StrategyError),

    // Faucet or forward-transfer failure for one wallet
    Funding(FundingError),

    // Pool simulator state errors
    Pool(PoolError),

    // Wallet persistence errors
    Store(StoreError),
}

impl std::fmt::Display for SwarmBotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwarmBotError::Configuration(e) => write!(f, "Configuration Error: {}", e),
            SwarmBotError::Network(e) => write!(f, "Network Error: {}", e),
            SwarmBotError::Strategy(e) => write!(f, "Strategy Error: {}", e),
            SwarmBotError::Funding(e) => write!(f, "Funding Error: {}", e),
            SwarmBotError::Pool(e) => write!(f, "Pool Error: {}", e),
            SwarmBotError::Store(e) => write!(f, "Store Error: {}", e),
        }
    }
}

impl std::error::Error for SwarmBotError {}

// =============================================================================
// CONFIGURATION ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum ConfigurationError {
    InvalidAmount { value: String, reason: String },
    InvalidDuration { value: String, reason: String },
    InvalidWalletCount { value: usize, reason: String },
    MissingPassphrase { env_var: String },
    Generic { message: String },
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::InvalidAmount { value, reason } => {
                write!(f, "Invalid amount {}: {}", value, reason)
            }
            ConfigurationError::InvalidDuration { value, reason } => {
                write!(f, "Invalid duration {}: {}", value, reason)
            }
            ConfigurationError::InvalidWalletCount { value, reason } => {
                write!(f, "Invalid wallet count {}: {}", value, reason)
            }
            ConfigurationError::MissingPassphrase { env_var } => {
                write!(f, "Wallet passphrase not set ({} is empty)", env_var)
            }
            ConfigurationError::Generic { message } => write!(f, "{}", message),
        }
    }
}

// =============================================================================
// NETWORK ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum NetworkError {
    RpcRequestFailed { endpoint: String, message: String },
    TransferFailed { from: String, to: String, message: String },
    ConfirmationFailed { signature: String, message: String },
    FaucetUnavailable { endpoint: String, message: String },
    Generic { message: String },
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::RpcRequestFailed { endpoint, message } => {
                write!(f, "RPC request to {} failed: {}", endpoint, message)
            }
            NetworkError::TransferFailed { from, to, message } => {
                write!(f, "Transfer {} -> {} failed: {}", from, to, message)
            }
            NetworkError::ConfirmationFailed { signature, message } => {
                write!(f, "Confirmation of {} failed: {}", signature, message)
            }
            NetworkError::FaucetUnavailable { endpoint, message } => {
                write!(f, "Faucet at {} unavailable: {}", endpoint, message)
            }
            NetworkError::Generic { message } => write!(f, "{}", message),
        }
    }
}

// =============================================================================
// STRATEGY ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum StrategyError {
    TickFailed { bot: String, message: String },
}

impl std::fmt::Display for StrategyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyError::TickFailed { bot, message } => {
                write!(f, "Tick failed for bot {}: {}", bot, message)
            }
        }
    }
}

// =============================================================================
// FUNDING ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum FundingError {
    WorkerUnavailable,
    GrantFailed { wallet: String, message: String },
    ForwardFailed { wallet: String, message: String },
    IntermediateNeverFunded { wallet: String },
    ResidualShareDepleted { wallet_count: usize },
}

impl std::fmt::Display for FundingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FundingError::WorkerUnavailable => write!(f, "Funding worker is not running"),
            FundingError::GrantFailed { wallet, message } => {
                write!(f, "Funding grant for {} failed: {}", wallet, message)
            }
            FundingError::ForwardFailed { wallet, message } => {
                write!(f, "Forward transfer to {} failed: {}", wallet, message)
            }
            FundingError::IntermediateNeverFunded { wallet } => {
                write!(f, "Intermediate wallet {} was never funded", wallet)
            }
            FundingError::ResidualShareDepleted { wallet_count } => {
                write!(
                    f,
                    "Jittered shares left no residual for the last of {} wallets",
                    wallet_count
                )
            }
        }
    }
}

// =============================================================================
// POOL ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum PoolError {
    NoPoolSet,
    Generic { message: String },
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolError::NoPoolSet => write!(f, "No pool is set"),
            PoolError::Generic { message } => write!(f, "{}", message),
        }
    }
}

// =============================================================================
// WALLET STORE ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum StoreError {
    DatabaseError { message: String },
    WrongPassphrase,
    CorruptRecord { address: String, message: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DatabaseError { message } => write!(f, "Database error: {}", message),
            StoreError::WrongPassphrase => {
                write!(f, "Wallet passphrase does not match this store")
            }
            StoreError::CorruptRecord { address, message } => {
                write!(f, "Corrupt wallet record {}: {}", address, message)
            }
        }
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<ConfigurationError> for SwarmBotError {
    fn from(e: ConfigurationError) -> Self {
        SwarmBotError::Configuration(e)
    }
}

impl From<NetworkError> for SwarmBotError {
    fn from(e: NetworkError) -> Self {
        SwarmBotError::Network(e)
    }
}

impl From<StrategyError> for SwarmBotError {
    fn from(e: StrategyError) -> Self {
        SwarmBotError::Strategy(e)
    }
}

impl From<FundingError> for SwarmBotError {
    fn from(e: FundingError) -> Self {
        SwarmBotError::Funding(e)
    }
}

impl From<PoolError> for SwarmBotError {
    fn from(e: PoolError) -> Self {
        SwarmBotError::Pool(e)
    }
}

impl From<StoreError> for SwarmBotError {
    fn from(e: StoreError) -> Self {
        SwarmBotError::Store(e)
    }
}

pub type SwarmResult<T> = Result<T, SwarmBotError>;
