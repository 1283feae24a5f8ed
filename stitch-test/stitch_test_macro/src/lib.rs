/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, ItemFn, LitInt};

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Runs an `async fn` as a test on a multi-threaded Tokio runtime.
///
/// Accepts an optional `timeout_ms = N`; the test panics once `N` milliseconds elapse.
#[proc_macro_attribute]
pub fn stitch_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut timeout_ms: Option<LitInt> = None;
    let arguments = syn::meta::parser(|meta| {
        if meta.path.is_ident("timeout_ms") {
            timeout_ms = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported stitch_test argument, expected `timeout_ms`"))
        }
    });
    parse_macro_input!(attr with arguments);

    let input = parse_macro_input!(item as ItemFn);
    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(&input.sig.fn_token, "stitch_test requires an async fn")
            .to_compile_error()
            .into();
    }

    let timeout = match timeout_ms {
        Some(literal) => match literal.base10_parse::<u64>() {
            Ok(value) => value,
            Err(e) => return e.to_compile_error().into(),
        },
        None => DEFAULT_TIMEOUT_MS,
    };

    let vis = &input.vis;
    let sig = &input.sig;
    let body = &input.block;
    let attrs = &input.attrs;
    let name = &sig.ident;
    let inputs = &sig.inputs;
    let output = &sig.output;

    let async_name = syn::Ident::new(&format!("__{name}_async"), name.span());

    let expanded = quote! {
        #[test]
        #(#attrs)*
        #vis fn #name() {
            use ::stitch_test::__private::{tokio, tracing};
            use ::stitch_test::TestOutcome as _;

            ::stitch_test::initialize_tracing();

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("failed to build the test runtime");

            let outcome = runtime.block_on(async {
                let test_span = tracing::info_span!("stitch_test", name = stringify!(#name));
                let limit = ::std::time::Duration::from_millis(#timeout);
                let fut = tracing::Instrument::instrument(#async_name(), test_span);
                match tokio::time::timeout(limit, fut).await {
                    Ok(outcome) => outcome,
                    Err(_) => panic!(
                        "test `{}` timed out after {} ms",
                        stringify!(#name),
                        #timeout
                    ),
                }
            });

            outcome.check();
        }

        async fn #async_name(#inputs) #output #body
    };

    expanded.into()
}
