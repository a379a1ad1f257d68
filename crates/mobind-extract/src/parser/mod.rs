pub mod parser;

pub use parser::*;

#[cfg(test)]
mod tests {
    use crate::ast::{ChanDir, FuncExpr, Qualifier, TypeExpr};
    use crate::parser::parse_type;

    fn ident(name: &str) -> TypeExpr {
        TypeExpr::Ident(name.to_string())
    }

    #[test]
    fn parses_composites() {
        assert_eq!(
            parse_type("map[string][]*Node").unwrap(),
            TypeExpr::Map(
                Box::new(ident("string")),
                Box::new(TypeExpr::Slice(Box::new(TypeExpr::Pointer(Box::new(ident("Node")))))),
            )
        );
        assert_eq!(
            parse_type("[16]byte").unwrap(),
            TypeExpr::Array(16, Box::new(ident("byte")))
        );
    }

    #[test]
    fn parses_qualified_names() {
        assert_eq!(
            parse_type("other.Thing").unwrap(),
            TypeExpr::Qualified {
                package: Qualifier::Name("other".into()),
                name: "Thing".into(),
            }
        );
        assert_eq!(
            parse_type(r#"*"example.com/other".Thing"#).unwrap(),
            TypeExpr::Pointer(Box::new(TypeExpr::Qualified {
                package: Qualifier::Path("example.com/other".into()),
                name: "Thing".into(),
            }))
        );
    }

    #[test]
    fn parses_function_types_with_named_params() {
        assert_eq!(
            parse_type("func(n int, s string) (int64, error)").unwrap(),
            TypeExpr::Func(FuncExpr {
                params: vec![ident("int"), ident("string")],
                results: vec![ident("int64"), ident("error")],
            })
        );
        assert_eq!(
            parse_type("func() error").unwrap(),
            TypeExpr::Func(FuncExpr {
                params: vec![],
                results: vec![ident("error")],
            })
        );
        assert_eq!(
            parse_type("[]func()").unwrap(),
            TypeExpr::Slice(Box::new(TypeExpr::Func(FuncExpr::default())))
        );
    }

    #[test]
    fn parses_unsupported_shapes() {
        assert_eq!(
            parse_type("<-chan int").unwrap(),
            TypeExpr::Chan(ChanDir::Recv, Box::new(ident("int")))
        );
        assert_eq!(parse_type("interface{}").unwrap(), TypeExpr::InterfaceLit);
        assert_eq!(parse_type("struct{ X int }").unwrap(), TypeExpr::StructLit);
        assert!(matches!(parse_type("List[int]").unwrap(), TypeExpr::Generic(_, ref args) if args.len() == 1));
        assert!(matches!(parse_type("...string").unwrap(), TypeExpr::Variadic(_)));
    }

    #[test]
    fn reports_malformed_input() {
        let err = parse_type("map[string").unwrap_err();
        assert!(err.message.contains("end of input"), "{}", err.message);
        assert!(parse_type("int int").is_err());
        assert!(parse_type("").is_err());
        assert!(parse_type("struct{").is_err());
    }
}
