use super::{Context, EntityModel};
use crate::emit::CodeBuilder;
use crate::error::Result;

/// The data class of one table or view.
pub(super) fn write_entity(ctx: &Context<'_>, model: &EntityModel<'_>) -> Result<String> {
    let mut cb = CodeBuilder::new();
    cb.append_line("using System;");
    if !model.collections.is_empty() {
        cb.append_line("using System.Collections.Generic;");
    }
    cb.append_blank();

    {
        let mut ns = cb.begin_brace(&format!("namespace {}.Models", ctx.namespace()));
        let header = match &model.base {
            Some(base) => format!("public class {} : {base}", model.class),
            None => format!("public class {}", model.class),
        };
        let kind = if model.is_view { "view" } else { "table" };
        let doc = format!("Class representing the {} {kind}.", model.table.name);
        let mut class = ns.begin_scope(&header, Some(&doc));

        if !model.collections.is_empty() {
            {
                let mut ctor = class.begin_brace(&format!("public {}()", model.class));
                for collection in &model.collections {
                    ctor.append_fmt(format_args!(
                        "{} = new List<{}>();",
                        collection.name, collection.child_class
                    ));
                }
            }
            class.append_blank();
        }

        for property in &model.properties {
            class.append_property(&property.ty, &property.name);
        }
        for nav in &model.navigations {
            class.append_virtual_property(&nav.target_class, &nav.name);
        }
        for collection in &model.collections {
            class.append_collection_property(
                &format!("ICollection<{}>", collection.child_class),
                &collection.name,
                true,
            );
        }
    }
    cb.finish()
}

#[cfg(test)]
mod tests {
    use crate::schema::fixtures::shop;
    use crate::settings::GeneratorSettings;
    use crate::synth::Generator;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_order_class() {
        let generation = Generator::new(&shop(), GeneratorSettings::default())
            .unwrap()
            .generate()
            .unwrap();
        let order = &generation.file("Models/Order.cs").unwrap().contents;

        let expected = "\
using System;

namespace Domain.Models
{
    /// <summary>
    /// Class representing the Orders table.
    /// </summary>
    public class Order
    {
        public int Id { get; set; }

        public int CustomerId { get; set; }

        public decimal? Total { get; set; }

        public virtual Customer Customer { get; set; }

    }
}
";
        assert_eq!(order, expected);
    }

    #[test]
    fn test_parent_initializes_collections() {
        let generation = Generator::new(&shop(), GeneratorSettings::default())
            .unwrap()
            .generate()
            .unwrap();
        let customer = &generation.file("Models/Customer.cs").unwrap().contents;

        assert!(customer.contains("using System.Collections.Generic;"));
        assert!(customer.contains(
            "        public Customer()\n        {\n            Orders = new List<Order>();\n        }\n"
        ));
        assert!(customer.contains("public virtual ICollection<Order> Orders { get; protected set; }"));
    }
}
