use super::{Context, EntityModel, member_selector, quote};
use crate::emit::CodeBuilder;
use crate::error::Result;

/// The mapping class tying an entity to its table, keys, columns and
/// relationships.
pub(super) fn write_mapping(ctx: &Context<'_>, model: &EntityModel<'_>) -> Result<String> {
    let mut cb = CodeBuilder::new();
    cb.append_fmt(format_args!("using {}.Models;", ctx.namespace()));
    cb.append_blank();

    {
        let mut ns = cb.begin_brace(&format!("namespace {}.Mapping", ctx.namespace()));
        let doc = format!(
            "Maps <see cref=\"{}\"/> onto {}.",
            model.class, model.table.name
        );
        let header = format!(
            "public class {0}Mapping : EntityMapping<{0}>",
            model.class
        );
        let mut class = ns.begin_scope(&header, Some(&doc));
        let mut ctor = class.begin_brace(&format!("public {}Mapping()", model.class));

        if model.is_view {
            ctor.append_fmt(format_args!("ToView({});", quote(&model.table.name)));
        } else {
            ctor.append_fmt(format_args!("ToTable({});", quote(&model.table.name)));
        }
        match (&model.base, model.key.is_empty()) {
            (Some(base), _) => ctor.append_fmt(format_args!("InheritsFrom<{base}>();")),
            (None, true) => ctor.append_line("HasNoKey();"),
            (None, false) => {
                ctor.append_fmt(format_args!("HasKey({});", member_selector("x", &model.key)));
            }
        }

        if !model.properties.is_empty() {
            ctor.append_blank();
        }
        for property in &model.properties {
            let column = property.column;
            let mut line = format!(
                "Property(x => x.{}).HasColumnName({})",
                property.name,
                quote(&column.name)
            );
            if !column.nullable {
                line.push_str(".IsRequired()");
            }
            if !column.data_type.is_empty() {
                line.push_str(&format!(".HasColumnType({})", quote(&column.data_type)));
            }
            line.push(';');
            ctor.append_line(&line);
        }

        if !model.navigations.is_empty() {
            ctor.append_blank();
        }
        for nav in &model.navigations {
            let inverse = match &nav.inverse {
                Some(collection) => format!("WithMany(x => x.{collection})"),
                None => "WithMany()".to_string(),
            };
            ctor.append_fmt(format_args!(
                "HasOne(x => x.{}).{inverse}.HasForeignKey({});",
                nav.name,
                member_selector("x", &nav.foreign_keys)
            ));
        }
    }
    cb.finish()
}
