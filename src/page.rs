//! Embedded data blob parsing
//!
//! Detail pages hydrate from inline scripts of the form
//!
//! ```text
//! AF_initDataCallback({key: 'ds:4', hash: '7', data:[...], sideChannel: {}});
//! var AF_dataServiceRequests = {'ds:8' : {id:'UsvDTd', request:[...]}};
//! ```
//!
//! Scripts are parsed with SWC and the literals converted to JSON. When SWC
//! rejects a script, a regex pass over the raw text is tried instead.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use swc_common::{sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::*;
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};
use tracing::debug;

use crate::extract::AuxiliaryDatasets;
use crate::mapping::{Field, Source};
use crate::node::{Datasets, Node};

const INIT_DATA_CALLBACK: &str = "AF_initDataCallback";
const SERVICE_REQUESTS: &str = "AF_dataServiceRequests";

/// Secondary request that produced a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub id: String,
}

/// Everything extracted from a page's inline scripts
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub datasets: Datasets,
    /// Dataset key and the request that produced it, in page order
    pub service_requests: Vec<(String, ServiceRequest)>,
}

impl ParsedPage {
    /// Parse all inline data scripts of `html`. Never fails; scripts that
    /// cannot be read are skipped.
    pub fn parse(html: &str) -> Self {
        let mut page = ParsedPage::default();
        let document = Html::parse_document(html);

        let selector = match Selector::parse("script") {
            Ok(s) => s,
            Err(_) => return page,
        };

        for element in document.select(&selector) {
            let script = element.text().collect::<String>();

            // the service request script also declares `var AF_initDataCallback;`
            if script.contains(SERVICE_REQUESTS) {
                page.service_requests.extend(parse_service_requests(&script));
            } else if script.contains(INIT_DATA_CALLBACK) {
                match parse_init_data(&script) {
                    Some((key, data)) => page.datasets.insert(key, Node::from(data)),
                    None => debug!(len = script.len(), "skipping unreadable data callback script"),
                }
            }
        }

        debug!(
            datasets = page.datasets.len(),
            service_requests = page.service_requests.len(),
            "parsed page scripts"
        );
        page
    }

    /// Request that produced the dataset under `key`
    pub fn service_request(&self, key: &str) -> Option<&ServiceRequest> {
        self.service_requests
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, request)| request)
    }

    /// Datasets for every auxiliary source named in `table`.
    ///
    /// The first service request in page order whose id matches decides the
    /// dataset, which is stored under the key the field's path expects. A
    /// matched request always gets a container, empty when its dataset could
    /// not be read. Only ids with no request at all are left out, so that
    /// extraction falls back to the primary data.
    pub fn auxiliary_datasets(&self, table: &[Field]) -> AuxiliaryDatasets {
        let mut auxiliary = AuxiliaryDatasets::new();

        for field in table {
            let Source::Auxiliary(request_id) = field.descriptor.source else {
                continue;
            };
            let Some((key, _)) = self
                .service_requests
                .iter()
                .find(|(_, request)| request.id == request_id)
            else {
                continue;
            };

            let container = auxiliary.entry(request_id.to_string()).or_default();
            match self.datasets.get(key) {
                Some(node) => container.insert(field.descriptor.path.dataset, node.clone()),
                None => debug!(key = %key, request_id, "no dataset for service request"),
            }
        }

        auxiliary
    }
}

/// Key and payload of an `AF_initDataCallback({...})` script
fn parse_init_data(source: &str) -> Option<(String, Value)> {
    let arg = parse_script(source).and_then(|script| {
        script.body.iter().find_map(|stmt| match stmt {
            Stmt::Expr(expr_stmt) => init_data_argument(&expr_stmt.expr),
            _ => None,
        })
    });

    match arg {
        Some(Value::Object(obj)) => {
            let key = obj.get("key")?.as_str()?.to_string();
            let data = obj.get("data")?.clone();
            Some((key, data))
        }
        _ => parse_init_data_regex(source),
    }
}

/// Converted object argument if `expr` is a call to `AF_initDataCallback`
fn init_data_argument(expr: &Expr) -> Option<Value> {
    let Expr::Call(call) = expr else {
        return None;
    };
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Ident(ident) = &**callee else {
        return None;
    };
    if ident.sym.as_str() != INIT_DATA_CALLBACK {
        return None;
    }
    let ExprOrSpread { expr: arg, .. } = call.args.first()?;
    expr_to_json(arg)
}

fn parse_init_data_regex(source: &str) -> Option<(String, Value)> {
    let key_re = Regex::new(r"(ds:.*?)'").ok()?;
    let value_re = Regex::new(r"data:([\s\S]*?), sideChannel: \{\}\}\);").ok()?;

    let key = key_re.captures(source)?.get(1)?.as_str().to_string();
    let raw = value_re.captures(source)?.get(1)?.as_str();
    let data = serde_json::from_str(raw).ok()?;
    Some((key, data))
}

/// Dataset key -> request id from `var AF_dataServiceRequests = {...}`
fn parse_service_requests(source: &str) -> Vec<(String, ServiceRequest)> {
    let declared = parse_script(source).and_then(|script| {
        script.body.iter().find_map(|stmt| match stmt {
            Stmt::Decl(Decl::Var(var_decl)) => var_decl.decls.iter().find_map(|decl| {
                let Pat::Ident(ident) = &decl.name else {
                    return None;
                };
                if ident.sym.as_str() != SERVICE_REQUESTS {
                    return None;
                }
                decl.init.as_deref().and_then(expr_to_json)
            }),
            _ => None,
        })
    });

    let value = match declared {
        Some(value) => value,
        None => match parse_service_requests_regex(source) {
            Some(value) => value,
            None => {
                debug!("skipping unreadable service request script");
                return Vec::new();
            }
        },
    };

    let Value::Object(entries) = value else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|(key, request)| {
            let id = request.get("id")?.as_str()?.to_string();
            Some((key, ServiceRequest { id }))
        })
        .collect()
}

fn parse_service_requests_regex(source: &str) -> Option<Value> {
    let re = Regex::new(r"\{'ds:[\s\S]*\}\}").ok()?;
    let literal = re.find(source)?.as_str();
    parse_js_value(literal).ok()
}

/// Parse a JavaScript object literal that is not valid JSON.
/// Handles single quotes, trailing commas and unquoted keys.
fn parse_js_value(js_str: &str) -> Result<Value, serde_json::Error> {
    if let Ok(v) = serde_json::from_str(js_str) {
        return Ok(v);
    }

    let mut json_str = js_str.replace('\'', "\"");

    if let Ok(trailing_comma) = Regex::new(r",\s*([}\]])") {
        json_str = trailing_comma.replace_all(&json_str, "$1").to_string();
    }
    if let Ok(unquoted_key) = Regex::new(r#"([{,]\s*)(\w+)\s*:"#) {
        json_str = unquoted_key.replace_all(&json_str, r#"$1"$2":"#).to_string();
    }

    serde_json::from_str(&json_str)
}

fn parse_script(source: &str) -> Option<Script> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Anon.into(), source.to_string());

    let lexer = Lexer::new(
        Syntax::Es(Default::default()),
        Default::default(),
        StringInput::from(&*fm),
        None,
    );

    let mut parser = Parser::new_from(lexer);
    parser.parse_script().ok()
}

/// Convert a JavaScript literal expression to JSON.
///
/// Object properties that are not plain literals (functions, spreads) are
/// dropped; array holes and unconvertible elements become `null`.
fn expr_to_json(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Lit(Lit::Str(s)) => Some(Value::String(s.value.as_str().unwrap_or("").to_string())),

        Expr::Lit(Lit::Num(n)) => number_to_json(n.value),

        Expr::Lit(Lit::Bool(b)) => Some(Value::Bool(b.value)),

        Expr::Lit(Lit::Null(_)) => Some(Value::Null),

        Expr::Object(obj) => {
            let mut map = Map::new();
            for prop in &obj.props {
                if let PropOrSpread::Prop(prop) = prop {
                    if let Prop::KeyValue(kv) = &**prop {
                        if let (Some(key), Some(value)) =
                            (prop_name_to_string(&kv.key), expr_to_json(&kv.value))
                        {
                            map.insert(key, value);
                        }
                    }
                }
            }
            Some(Value::Object(map))
        }

        Expr::Array(arr) => Some(Value::Array(
            arr.elems
                .iter()
                .map(|elem| match elem {
                    Some(ExprOrSpread { expr, .. }) => expr_to_json(expr).unwrap_or(Value::Null),
                    None => Value::Null,
                })
                .collect(),
        )),

        Expr::Unary(unary) if unary.op == UnaryOp::Minus => match &*unary.arg {
            Expr::Lit(Lit::Num(n)) => number_to_json(-n.value),
            _ => None,
        },

        Expr::Paren(paren) => expr_to_json(&paren.expr),

        Expr::Tpl(tpl) if tpl.exprs.is_empty() => tpl
            .quasis
            .first()
            .map(|quasi| Value::String(quasi.raw.as_str().to_string())),

        _ => None,
    }
}

fn number_to_json(value: f64) -> Option<Value> {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(Value::Number(serde_json::Number::from(value as i64)))
    } else {
        serde_json::Number::from_f64(value).map(Value::Number)
    }
}

fn prop_name_to_string(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.as_str().to_string()),
        PropName::Str(s) => s.value.as_str().map(|v| v.to_string()),
        PropName::Num(n) => Some(n.value.to_string()),
        _ => None,
    }
}
