use super::{Context, EntityModel, Property, lambda_var};
use crate::emit::CodeBuilder;
use crate::error::Result;

/// Columns a caller supplies when adding a row: everything except generated
/// identity keys. Key columns that are also foreign keys stay.
pub(super) fn input_properties<'m, 'a>(
    model: &'m EntityModel<'a>,
) -> impl Iterator<Item = &'m Property<'a>> {
    model
        .properties
        .iter()
        .filter(|p| !p.column.is_primary_key || p.column.is_foreign_key)
}

/// Object type, resolvers, input and payload types of one table.
pub(super) fn write_api_type(ctx: &Context<'_>, model: &EntityModel<'_>) -> Result<String> {
    let mut cb = CodeBuilder::new();
    cb.append_line("using System.Linq;");
    cb.append_fmt(format_args!("using {}.Data;", ctx.namespace()));
    cb.append_fmt(format_args!("using {}.Models;", ctx.namespace()));
    cb.append_blank();

    {
        let mut ns = cb.begin_brace(&format!("namespace {}.Api", ctx.namespace()));
        write_object_type(ctx, &mut ns, model);
        if has_resolvers(model) {
            ns.append_blank();
            write_resolvers(ctx, &mut ns, model);
        }
        ns.append_blank();
        write_input(&mut ns, model);
        ns.append_blank();
        write_payload(&mut ns, model);
    }
    cb.finish()
}

fn has_resolvers(model: &EntityModel<'_>) -> bool {
    model.navigations.iter().any(|n| n.resolver.is_some())
        || model.collections.iter().any(|c| c.resolver.is_some())
}

fn write_object_type(ctx: &Context<'_>, cb: &mut CodeBuilder, model: &EntityModel<'_>) {
    let class = &model.class;
    let doc = format!("Object type exposing the {} table.", model.table.name);
    let mut ty = cb.begin_scope(&format!("public class {class}Type : ObjectType<{class}>"), Some(&doc));
    let mut configure = ty.begin_brace(&format!(
        "protected override void Configure(IObjectTypeDescriptor<{class}> descriptor)"
    ));
    configure.append_fmt(format_args!(
        "descriptor.Description(\"Represents any executable {class}.\");"
    ));
    configure.append_blank();

    for property in &model.properties {
        configure.append_fmt(format_args!(
            "descriptor.Field(x => x.{0}).Description(\"Represents the {0} of the {class}.\");",
            property.name
        ));
    }
    for nav in &model.navigations {
        let Some(resolver) = &nav.resolver else {
            continue;
        };
        configure.append_fmt(format_args!(
            "descriptor.Field(x => x.{}).ResolveWith<{class}Resolvers>(r => r.{resolver}(default!, default!)).Description(\"The {} this {class} refers to.\");",
            nav.name, nav.target_class
        ));
    }
    for collection in &model.collections {
        let Some(resolver) = &collection.resolver else {
            continue;
        };
        let children = ctx
            .model(&collection.child_table)
            .map(|child| child.set_name.as_str())
            .unwrap_or(collection.child_class.as_str());
        configure.append_fmt(format_args!(
            "descriptor.Field(x => x.{}).ResolveWith<{class}Resolvers>(r => r.{resolver}(default!, default!)).Description(\"The {children} related to this {class}.\");",
            collection.name
        ));
    }
}

fn write_resolvers(ctx: &Context<'_>, cb: &mut CodeBuilder, model: &EntityModel<'_>) {
    let class = &model.class;
    let param = model.variable();
    let x = lambda_var(&param);
    let doc = format!("Resolves the relationships of <see cref=\"{class}\"/>.");
    let mut resolvers = cb.begin_scope(&format!("public class {class}Resolvers"), Some(&doc));

    let mut first = true;
    for nav in &model.navigations {
        let (Some(resolver), Some(target)) = (&nav.resolver, ctx.model(&nav.target_table)) else {
            continue;
        };
        if !std::mem::take(&mut first) {
            resolvers.append_blank();
        }
        let foreign_key = nav.foreign_keys.first().map(String::as_str).unwrap_or_default();
        let mut method = resolvers.begin_brace(&format!(
            "public {} {resolver}([Parent] {class} {param}, IDataContext context)",
            nav.target_class
        ));
        method.append_fmt(format_args!(
            "return context.{}.FirstOrDefault({x} => {x}.{} == {param}.{foreign_key});",
            target.set_name,
            target.key_property()
        ));
    }
    for collection in &model.collections {
        let (Some(resolver), Some(child)) = (&collection.resolver, ctx.model(&collection.child_table))
        else {
            continue;
        };
        if !std::mem::take(&mut first) {
            resolvers.append_blank();
        }
        let foreign_key = collection
            .foreign_keys
            .first()
            .map(String::as_str)
            .unwrap_or_default();
        let mut method = resolvers.begin_brace(&format!(
            "public IQueryable<{}> {resolver}([Parent] {class} {param}, IDataContext context)",
            collection.child_class
        ));
        method.append_fmt(format_args!(
            "return context.{}.Where({x} => {x}.{foreign_key} == {param}.{});",
            child.set_name,
            model.key_property()
        ));
    }
}

fn write_input(cb: &mut CodeBuilder, model: &EntityModel<'_>) {
    let class = &model.class;
    let params: Vec<String> = input_properties(model)
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect();
    cb.append_doc_comment(&format!("Input for adding a {class}."));
    cb.append_fmt(format_args!(
        "public record Add{class}Input({});",
        params.join(", ")
    ));
    cb.append_blank();

    let mut ty = cb.begin_brace(&format!(
        "public class Add{class}InputType : InputObjectType<Add{class}Input>"
    ));
    let mut configure = ty.begin_brace(&format!(
        "protected override void Configure(IInputObjectTypeDescriptor<Add{class}Input> descriptor)"
    ));
    configure.append_fmt(format_args!(
        "descriptor.Description(\"Represents the input type for the {class}.\");"
    ));
    for property in input_properties(model) {
        configure.append_fmt(format_args!(
            "descriptor.Field(x => x.{0}).Description(\"Represents the {0} for the {class}.\");",
            property.name
        ));
    }
}

fn write_payload(cb: &mut CodeBuilder, model: &EntityModel<'_>) {
    let class = &model.class;
    let param = model.variable();
    cb.append_fmt(format_args!("public record Add{class}Payload({class} {param});"));
    cb.append_blank();

    let mut ty = cb.begin_brace(&format!(
        "public class Add{class}PayloadType : ObjectType<Add{class}Payload>"
    ));
    let mut configure = ty.begin_brace(&format!(
        "protected override void Configure(IObjectTypeDescriptor<Add{class}Payload> descriptor)"
    ));
    configure.append_fmt(format_args!(
        "descriptor.Description(\"Represents the payload to return for an added {class}.\");"
    ));
    configure.append_fmt(format_args!(
        "descriptor.Field(x => x.{param}).Description(\"Represents the added {class}.\");"
    ));
}
