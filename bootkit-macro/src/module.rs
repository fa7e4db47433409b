use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, Attribute, ExprPath, ItemStruct, Path,
    Token,
};

struct DependencyItem {
    attrs: Vec<Attribute>,
    path: Path,
}

impl Parse for DependencyItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let path = input.parse()?;
        Ok(DependencyItem { attrs, path })
    }
}

struct ModuleArgs {
    depends_on: Vec<DependencyItem>,
    create: Option<ExprPath>,
}

impl Parse for ModuleArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut depends_on = Vec::new();
        let mut create = None;

        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            if name == "depends_on" {
                // Parse array: [Module1, Module2, ...]
                let content;
                syn::bracketed!(content in input);
                let items = content.parse_terminated(DependencyItem::parse, Token![,])?;
                depends_on = items.into_iter().collect();
            } else if name == "create" {
                create = Some(input.parse()?);
            } else {
                return Err(syn::Error::new(
                    name.span(),
                    "unknown module argument, expected `depends_on` or `create`",
                ));
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(ModuleArgs { depends_on, create })
    }
}

pub fn module_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ModuleArgs);
    let input = parse_macro_input!(item as ItemStruct);
    let expanded = generate_module_impl(&args, &input);

    TokenStream::from(expanded)
}

fn generate_module_impl(args: &ModuleArgs, input: &ItemStruct) -> TokenStream2 {
    let module_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Declare dependencies in the order they were listed
    let declarations = args.depends_on.iter().map(|item| {
        let path = &item.path;
        let attrs = &item.attrs;
        quote! {
            #(#attrs)*
            deps.module::<#path>();
        }
    });

    let construct = match &args.create {
        Some(create) => quote! { #create() },
        None => quote! { <Self as ::core::default::Default>::default() },
    };

    quote! {
        #input

        impl #impl_generics ::bootkit::ModuleType for #module_name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn create(deps: &mut ::bootkit::DependsOn) -> Self {
                #(#declarations)*
                #construct
            }
        }
    }
}
