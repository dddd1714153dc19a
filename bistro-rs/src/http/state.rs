use std::sync::Arc;

use crate::payment::PaymentClient;
use crate::store::Store;
use crate::token::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub tokens: Arc<TokenService>,
    pub payments: PaymentClient,
}
