use proc_macro2::*;
use quote::quote;
use syn::*;

/// Automatically implements `BspValue` on structs in the order of the fields, or unit enums with `#[repr(...)]` and explicit discriminants (e.g. `Foo = 1`).
///
/// The generated `bsp_struct_size` is the sum of the field sizes, so any field whose size depends on the [`BspParseContext`](::vbsp::reader::BspParseContext)
/// makes the whole record context-dependent as well.
///
/// Fields of type `Option<T>` can be marked with `#[bsp(present_if = some_fn)]`, where `some_fn` takes a `&BspParseContext` and returns whether the field is
/// stored in the file. If it isn't, the field is `None` and takes up no space.
#[proc_macro_derive(BspValue, attributes(bsp))]
pub fn bsp_value_derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	let ident = input.ident;

	let (bsp_parse_contents, bsp_struct_size_contents) = match input.data {
		Data::Struct(data) => match data.fields {
			Fields::Named(fields) => {
				let mut field_parsers = Vec::new();
				let mut field_sizes = Vec::new();

				for field in &fields.named {
					let field_name = field.ident.as_ref().expect("Ident required");
					let job = quote! { concat!("Reading field \"", stringify!(#field_name), "\" on type ", stringify!(#ident)) };

					match present_if(field) {
						Some(condition) => {
							let inner_ty = option_inner_type(&field.ty).expect("#[bsp(present_if = ..)] fields must be of type Option<T>");

							field_parsers.push(quote! {
								#field_name: if #condition(reader.ctx) {
									Some(::vbsp::BspParseResultDoingJobExt::job(<#inner_ty as ::vbsp::reader::BspValue>::bsp_parse(reader), #job)?)
								} else {
									None
								}
							});
							field_sizes.push(quote! {
								(if #condition(ctx) { <#inner_ty as ::vbsp::reader::BspValue>::bsp_struct_size(ctx) } else { 0 })
							});
						}
						None => {
							let ty = &field.ty;
							field_parsers.push(quote! {
								#field_name: ::vbsp::BspParseResultDoingJobExt::job(<#ty as ::vbsp::reader::BspValue>::bsp_parse(reader), #job)?
							});
							field_sizes.push(quote! { <#ty as ::vbsp::reader::BspValue>::bsp_struct_size(ctx) });
						}
					}
				}

				(
					quote! {
						Ok(Self {
							#(#field_parsers,)*
						})
					},
					quote! { #(#field_sizes + )* 0 },
				)
			}
			Fields::Unnamed(_) => panic!("Tuple structs not supported"),
			Fields::Unit => panic!("Unit structs not supported"),
		},
		Data::Enum(data) => {
			for variant in &data.variants {
				if !variant.fields.is_empty() {
					panic!("Only unit enums are supported!");
				}
			}

			let repr = input
				.attrs
				.iter()
				.flat_map(|attr| attr.meta.require_list().ok())
				.filter(|attr| compare_path(&attr.path, "repr"))
				.map(|attr| &attr.tokens)
				.next()
				.expect("#[repr(...)] required");

			let variants = data.variants.iter().map(|variant| &variant.ident);
			let numbers = data.variants.iter().map(|variant| {
				&variant
					.discriminant
					.as_ref()
					.expect("Explicit discriminants required for all variants! (e.g. Foo = 1)")
					.1
			});
			let (variants2, numbers2) = (variants.clone(), numbers.clone());

			(
				quote! { match <#repr as ::vbsp::reader::BspValue>::bsp_parse(reader)? {
					#(#numbers => Ok(Self::#variants)),*,
					n => Err(::vbsp::BspParseError::InvalidVariant { value: n as i64, acceptable: concat!(#(stringify!(#numbers2), " - ", stringify!(#variants2), "\n"),*) }),
				} },
				quote! {
					let _ = ctx;
					::core::mem::size_of::<#repr>()
				},
			)
		}
		_ => panic!("Only structs and unit enums supported"),
	};

	quote! {
		impl ::vbsp::reader::BspValue for #ident {
			fn bsp_parse(reader: &mut ::vbsp::reader::BspByteReader) -> ::vbsp::BspResult<Self> {
				#bsp_parse_contents
			}
			fn bsp_struct_size(ctx: &::vbsp::reader::BspParseContext) -> usize {
				#bsp_struct_size_contents
			}
		}
	}
	.into()
}

/// Returns the condition of a `#[bsp(present_if = ..)]` attribute on `field`, if it has one.
fn present_if(field: &Field) -> Option<Path> {
	let mut condition = None;

	for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("bsp")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("present_if") {
				condition = Some(meta.value()?.parse::<Path>()?);
				Ok(())
			} else {
				Err(meta.error("Unknown bsp attribute, expected `present_if`"))
			}
		})
		.expect("Malformed #[bsp(..)] attribute");
	}

	condition
}

/// If `ty` is `Option<T>`, returns `T`.
fn option_inner_type(ty: &Type) -> Option<&Type> {
	let Type::Path(TypePath { qself: None, path }) = ty else { return None };
	let segment = path.segments.last()?;
	if segment.ident != "Option" {
		return None;
	}
	let PathArguments::AngleBracketed(args) = &segment.arguments else { return None };

	match args.args.first()? {
		GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
		_ => None,
	}
}

fn compare_path(path: &Path, s: &str) -> bool {
	path.segments
		== [PathSegment {
			ident: Ident::new(s, Span::mixed_site()),
			arguments: PathArguments::None,
		}]
		.into_iter()
		.collect()
}
