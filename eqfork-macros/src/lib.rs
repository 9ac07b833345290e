//! Internal macros for the eqfork equation solver.
use quote::quote;
use syn::{parse_quote, Attribute, Expr, Lit, LitStr, Meta, MetaNameValue};
use synstructure::decl_derive;

/// Doc comment lines of a field, with the leading space removed.
fn doc_lines(attrs: &[Attribute]) -> Vec<LitStr> {
    let mut lines = vec![];
    for attr in attrs.iter() {
        if let Ok(Meta::NameValue(MetaNameValue {
            path,
            lit: Lit::Str(doc_str),
            ..
        })) = attr.parse_meta()
        {
            if path.is_ident("doc") {
                lines.push(doc_str);
            }
        }
    }
    lines
}

/// Derives a default instance and a help text from the documentation.
///
/// Each field's default value is taken from a `(Default: <expr>)` annotation in its doc comment.
/// Fields without annotation use `Default::default()`. The generated `help()` lists every field
/// with its documentation.
fn derive_doc_default(s: synstructure::Structure) -> proc_macro2::TokenStream {
    let variant = match s.variants() {
        [variant] => variant,
        _ => panic!("DocDefault requires a struct"),
    };

    let default_re = regex::Regex::new(r"\(Default: (.*)\)").unwrap();

    let body = variant.construct(|field, _| {
        let mut default_value: Expr = parse_quote!(Default::default());
        for doc_str in doc_lines(&field.attrs) {
            if let Some(default_str) = default_re.captures(&doc_str.value()) {
                let default_str = default_str.get(1).unwrap().as_str();
                let default_str = LitStr::new(default_str, doc_str.span());
                default_value = default_str
                    .parse()
                    .expect("error parsing default expression");
            }
        }
        default_value
    });

    let mut help = String::new();
    for field in variant.ast().fields.iter() {
        let name = match &field.ident {
            Some(ident) => ident.to_string(),
            None => continue,
        };
        help.push_str(&name);
        help.push_str(":\n");
        for doc_str in doc_lines(&field.attrs) {
            help.push_str("   ");
            help.push_str(&doc_str.value());
            help.push('\n');
        }
    }

    let default_impl = s.gen_impl(quote! {
        gen impl Default for @Self {
            fn default() -> Self {
                #body
            }
        }
    });

    let ident = &s.ast().ident;
    let (impl_generics, ty_generics, where_clause) = s.ast().generics.split_for_impl();

    quote! {
        #default_impl

        impl #impl_generics #ident #ty_generics #where_clause {
            /// Documentation of all configuration options.
            pub fn help() -> &'static str {
                #help
            }
        }
    }
}

decl_derive!([DocDefault] => derive_doc_default);
