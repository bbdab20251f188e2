use std::path::Path;

use trace_contract::{dispatch, ProductRecord, Response, StaticIdentity};

use super::{block_on, fail, open_engine};
use crate::OutputFormat;

/// A named operation and the caller it runs as.
pub(crate) struct Invocation<'a> {
    pub(crate) function: &'a str,
    pub(crate) args: &'a [String],
    /// Empty means the caller asserts no affiliation.
    pub(crate) affiliation: &'a str,
    pub(crate) permissions: Option<&'a str>,
}

impl Invocation<'_> {
    fn caller(&self) -> StaticIdentity {
        let mut identity = StaticIdentity::anonymous();
        if !self.affiliation.is_empty() {
            identity.affiliation = Some(self.affiliation.to_string());
        }
        match self.permissions {
            Some(raw) => identity.with_permissions(raw),
            None => identity,
        }
    }
}

pub(crate) fn cmd_invoke(
    ledger_path: &Path,
    invocation: Invocation<'_>,
    output: OutputFormat,
    quiet: bool,
) {
    let engine = open_engine(ledger_path, output, quiet);
    let caller = invocation.caller();
    let response = block_on(
        dispatch::invoke(&engine, &caller, invocation.function, invocation.args),
        output,
        quiet,
    );

    let payload = match response {
        Response::Success(bytes) => bytes,
        Response::Failure(failure) => fail(&failure, output, quiet),
    };
    match output {
        OutputFormat::Json => println!("{}", String::from_utf8_lossy(&payload)),
        OutputFormat::Text => match serde_json::from_slice::<ProductRecord>(&payload) {
            Ok(record) if !quiet => print_record(&record),
            Ok(_) => {}
            Err(_) => println!("{}", String::from_utf8_lossy(&payload)),
        },
    }
}

fn print_record(record: &ProductRecord) {
    println!("{}: {}", record.product_id, record.state);
    for (state, at) in &record.history {
        println!("  {:<12} {}", state, at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_contract::IdentityAssertion;

    fn invocation<'a>(affiliation: &'a str, permissions: Option<&'a str>) -> Invocation<'a> {
        Invocation {
            function: "createProduct",
            args: &[],
            affiliation,
            permissions,
        }
    }

    #[test]
    fn caller_from_flags() {
        let caller = invocation("Supplier", Some("manufacture|inspect")).caller();
        let assertion = IdentityAssertion::resolve(&caller);
        assert_eq!(assertion.affiliation, "Supplier");
        assert!(assertion.has_permission("manufacture"));
        assert!(assertion.has_permission("inspect"));
    }

    #[test]
    fn no_flags_means_no_credentials() {
        let caller = invocation("", None).caller();
        assert_eq!(caller, StaticIdentity::anonymous());
        let assertion = IdentityAssertion::resolve(&caller);
        assert!(assertion.has_permission("default"));
    }
}
