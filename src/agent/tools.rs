//! Tool Selector and Tool Registry
//!
//! The selector is a pure total function from raw user text to the tool-set
//! offered to the model for that turn. The registry maps tool names to
//! synchronous, side-effect-free mock implementations.

use serde_json::{json, Value};

use crate::types::{ToolDeclaration, ToolSet};

/// Finance-related keywords that switch the turn from web search to the
/// balance-lookup tool. Matched case-insensitively, substring membership.
pub const FINANCE_KEYWORDS: &[&str] = &[
    "saldo",
    "dinheiro",
    "conta",
    "gastar",
    "orçamento",
    "limite",
    "tenho",
    "pobre",
    "rico",
    "comprar",
];

/// Decide which tool-set to offer the model for this turn.
///
/// Any finance keyword in the text yields exactly the balance-lookup
/// declaration; otherwise the generic search capability. The two sets are
/// never combined.
pub fn select_tools(user_text: &str) -> ToolSet {
    let lower = user_text.to_lowercase();
    if FINANCE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        ToolSet::Declarations(vec![balance_declaration()])
    } else {
        ToolSet::Search
    }
}

/// Declaration for the TravelCash balance lookup. The dummy `check`
/// parameter keeps the schema non-empty, which some model endpoints require.
pub fn balance_declaration() -> ToolDeclaration {
    ToolDeclaration {
        name: "get_balance".to_string(),
        description: "Retorna o saldo atual da conta TravelCash do usuário. Use quando \
                      perguntarem sobre valores, dinheiro disponível, ou se podem comprar algo."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "check": {
                    "type": "string",
                    "description": "Apenas envie 'status' para confirmar."
                }
            },
            "required": ["check"]
        }),
    }
}

/// Execute a registered tool by name.
///
/// Returns `None` for unknown tool names: the loop skips the call instead of
/// failing the exchange. The single registered tool returns static mock data
/// and performs no real account query.
pub fn execute_tool(name: &str) -> Option<Value> {
    match name {
        "get_balance" => Some(get_balance()),
        _ => None,
    }
}

fn get_balance() -> Value {
    json!({
        "amount": 15450.75,
        "currency": "BRL",
        "status": "available"
    })
}
